//! Device status readings: battery, free storage and location

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Mean Earth radius used for fix-to-fix distances
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Battery charging state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChargingState {
    #[default]
    Unknown,
    Unplugged,
    Charging,
    Full,
}

impl ChargingState {
    pub fn is_charging(&self) -> bool {
        matches!(self, Self::Charging)
    }
}

/// A battery sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    /// Charge fraction in 0.0..=1.0
    pub level: f32,
    pub charging: ChargingState,
}

impl BatteryReading {
    pub fn new(level: f32, charging: ChargingState) -> Self {
        Self {
            level: level.clamp(0.0, 1.0),
            charging,
        }
    }

    /// Whole percentage, rounded
    pub fn percent(&self) -> u8 {
        (self.level * 100.0).round() as u8
    }
}

impl fmt::Display for BatteryReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())?;
        if self.charging.is_charging() {
            write!(f, " (charging)")?;
        }
        Ok(())
    }
}

/// A free-space sample for the volume holding the recordings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageReading {
    pub free_bytes: u64,
}

impl StorageReading {
    pub fn free_gb(&self) -> f64 {
        self.free_bytes as f64 / BYTES_PER_GB
    }
}

impl fmt::Display for StorageReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}GB Free", self.free_gb())
    }
}

/// A location fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: i64,
}

impl LocationFix {
    /// Great-circle distance to another fix in meters
    pub fn distance_to(&self, other: &LocationFix) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

impl fmt::Display for LocationFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Whether location tracking continues outside the interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    #[default]
    Foreground,
    Background,
}

impl LocationMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Foreground => "foreground",
            Self::Background => "background",
        }
    }
}

impl fmt::Display for LocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LocationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "foreground" => Ok(Self::Foreground),
            "background" => Ok(Self::Background),
            _ => Err(ConfigError::ValidationError {
                key: "location.mode".to_string(),
                message: format!("Invalid value '{}'. Valid: foreground, background", s),
            }),
        }
    }
}

/// Requested location accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocationAccuracy {
    Lowest,
    Low,
    #[default]
    Balanced,
    High,
    Highest,
}

impl LocationAccuracy {
    pub const ALL: [LocationAccuracy; 5] = [
        Self::Lowest,
        Self::Low,
        Self::Balanced,
        Self::High,
        Self::Highest,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lowest => "lowest",
            Self::Low => "low",
            Self::Balanced => "balanced",
            Self::High => "high",
            Self::Highest => "highest",
        }
    }
}

impl fmt::Display for LocationAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LocationAccuracy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == lower)
            .ok_or_else(|| ConfigError::ValidationError {
                key: "location.accuracy".to_string(),
                message: format!(
                    "Invalid value '{}'. Valid: lowest, low, balanced, high, highest",
                    s
                ),
            })
    }
}
