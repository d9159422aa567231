//! Capture option bundles

use std::fmt;
use std::str::FromStr;

use crate::domain::error::ConfigError;

/// Sample rate used by the low-quality preset
pub const LOW_QUALITY_SAMPLE_RATE: u32 = 16_000;

/// Container written by the capture adapter
pub const CAPTURE_EXTENSION: &str = "wav";

/// Audio session mode requested before opening a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioMode {
    pub allows_recording: bool,
    pub plays_in_silent_mode: bool,
    pub stays_active_in_background: bool,
}

impl AudioMode {
    /// Mode for an interactive capture
    pub const fn recording() -> Self {
        Self {
            allows_recording: true,
            plays_in_silent_mode: true,
            stays_active_in_background: false,
        }
    }

    /// Mode for a capture run by the background scheduler
    pub const fn background_recording() -> Self {
        Self {
            allows_recording: true,
            plays_in_silent_mode: true,
            stays_active_in_background: true,
        }
    }
}

/// Capture quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CapturePreset {
    /// Device native rate
    #[default]
    HighQuality,
    /// Mono 16 kHz, suited to speech
    LowQuality,
}

impl CapturePreset {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HighQuality => "high",
            Self::LowQuality => "low",
        }
    }

    /// Output sample rate, or None to keep the device rate
    pub const fn target_sample_rate(&self) -> Option<u32> {
        match self {
            Self::HighQuality => None,
            Self::LowQuality => Some(LOW_QUALITY_SAMPLE_RATE),
        }
    }
}

impl fmt::Display for CapturePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CapturePreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::HighQuality),
            "low" => Ok(Self::LowQuality),
            _ => Err(ConfigError::ValidationError {
                key: "quality".to_string(),
                message: format!("Invalid value '{}'. Valid: high, low", s),
            }),
        }
    }
}
