//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::capture::CapturePreset;
use crate::domain::permission::PermissionStatus;
use crate::domain::recording::Duration;
use crate::domain::status::{LocationAccuracy, LocationMode};

/// Application directory name under the platform data/config roots
pub const APP_DIR_NAME: &str = "pocket-recorder";

/// Default public endpoint for IP-based location
pub const DEFAULT_LOCATION_ENDPOINT: &str = "http://ip-api.com/json";

/// Default battery polling interval (5 seconds)
pub const DEFAULT_BATTERY_POLL_SECS: u64 = 5;

/// Default location update interval (10 seconds)
pub const DEFAULT_LOCATION_INTERVAL_SECS: u64 = 10;

/// Default minimum distance between published fixes (10 meters)
pub const DEFAULT_LOCATION_DISTANCE_M: f64 = 10.0;

/// Default background cycle budget (90 seconds)
pub const DEFAULT_BACKGROUND_BUDGET_SECS: u64 = 90;

/// Background capture settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    pub enabled: Option<bool>,
    pub interval: Option<String>,
    pub capture_duration: Option<String>,
    pub budget: Option<String>,
}

/// Location tracking settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub enabled: Option<bool>,
    pub mode: Option<String>,
    pub accuracy: Option<String>,
    pub time_interval: Option<String>,
    pub distance_interval: Option<f64>,
    pub source: Option<String>,
    pub endpoint: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// User consent, standing in for OS permission prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionsConfig {
    pub microphone: Option<String>,
    pub location: Option<String>,
}

/// How far the user allows location access to go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationGrant {
    Denied,
    Foreground,
    Background,
}

/// Where location fixes come from
#[derive(Debug, Clone, PartialEq)]
pub enum LocationSourceKind {
    Ip { endpoint: String },
    Fixed { latitude: f64, longitude: f64 },
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub recordings_dir: Option<String>,
    pub tick: Option<String>,
    pub quality: Option<String>,
    pub notify: Option<bool>,
    pub storage_poll_interval: Option<String>,
    pub battery_poll_interval: Option<String>,
    pub background: Option<BackgroundConfig>,
    pub location: Option<LocationConfig>,
    pub permissions: Option<PermissionsConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            recordings_dir: None,
            tick: Some("100ms".to_string()),
            quality: Some("high".to_string()),
            notify: Some(true),
            storage_poll_interval: Some("1m".to_string()),
            battery_poll_interval: Some("5s".to_string()),
            background: Some(BackgroundConfig {
                enabled: Some(false),
                interval: Some("1m".to_string()),
                capture_duration: Some("30s".to_string()),
                budget: Some("1m30s".to_string()),
            }),
            location: Some(LocationConfig {
                enabled: Some(false),
                mode: Some("foreground".to_string()),
                accuracy: Some("balanced".to_string()),
                time_interval: Some("10s".to_string()),
                distance_interval: Some(DEFAULT_LOCATION_DISTANCE_M),
                source: Some("ip".to_string()),
                endpoint: Some(DEFAULT_LOCATION_ENDPOINT.to_string()),
                latitude: None,
                longitude: None,
            }),
            permissions: Some(PermissionsConfig {
                microphone: Some("granted".to_string()),
                location: Some("foreground".to_string()),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            recordings_dir: other.recordings_dir.or(self.recordings_dir),
            tick: other.tick.or(self.tick),
            quality: other.quality.or(self.quality),
            notify: other.notify.or(self.notify),
            storage_poll_interval: other.storage_poll_interval.or(self.storage_poll_interval),
            battery_poll_interval: other.battery_poll_interval.or(self.battery_poll_interval),
            background: merge_section(self.background, other.background, |b, o| {
                BackgroundConfig {
                    enabled: o.enabled.or(b.enabled),
                    interval: o.interval.or(b.interval),
                    capture_duration: o.capture_duration.or(b.capture_duration),
                    budget: o.budget.or(b.budget),
                }
            }),
            location: merge_section(self.location, other.location, |b, o| LocationConfig {
                enabled: o.enabled.or(b.enabled),
                mode: o.mode.or(b.mode),
                accuracy: o.accuracy.or(b.accuracy),
                time_interval: o.time_interval.or(b.time_interval),
                distance_interval: o.distance_interval.or(b.distance_interval),
                source: o.source.or(b.source),
                endpoint: o.endpoint.or(b.endpoint),
                latitude: o.latitude.or(b.latitude),
                longitude: o.longitude.or(b.longitude),
            }),
            permissions: merge_section(self.permissions, other.permissions, |b, o| {
                PermissionsConfig {
                    microphone: o.microphone.or(b.microphone),
                    location: o.location.or(b.location),
                }
            }),
        }
    }

    /// Managed recordings directory, or `<data dir>/pocket-recorder/audio`
    pub fn recordings_dir_or_default(&self) -> PathBuf {
        match self.recordings_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
                .join("audio"),
        }
    }

    /// Elapsed display tick, or default if not set/invalid/out of range
    pub fn tick_or_default(&self) -> Duration {
        parse_duration(&self.tick)
            .filter(Duration::is_valid_tick)
            .unwrap_or_else(Duration::default_tick)
    }

    /// Capture preset, or high quality if not set/invalid
    pub fn quality_or_default(&self) -> CapturePreset {
        self.quality
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get notify setting, or true if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(true)
    }

    pub fn storage_poll_interval_or_default(&self) -> Duration {
        parse_duration(&self.storage_poll_interval).unwrap_or_else(Duration::default_storage_poll)
    }

    pub fn battery_poll_interval_or_default(&self) -> Duration {
        parse_duration(&self.battery_poll_interval)
            .unwrap_or(Duration::from_secs(DEFAULT_BATTERY_POLL_SECS))
    }

    pub fn background_enabled_or_default(&self) -> bool {
        self.background
            .as_ref()
            .and_then(|b| b.enabled)
            .unwrap_or(false)
    }

    pub fn background_interval_or_default(&self) -> Duration {
        parse_duration(&self.background.as_ref().and_then(|b| b.interval.clone()))
            .unwrap_or_else(Duration::default_background_interval)
    }

    pub fn background_capture_duration_or_default(&self) -> Duration {
        parse_duration(&self.background.as_ref().and_then(|b| b.capture_duration.clone()))
            .unwrap_or_else(Duration::default_background_capture)
    }

    pub fn background_budget_or_default(&self) -> Duration {
        parse_duration(&self.background.as_ref().and_then(|b| b.budget.clone()))
            .unwrap_or(Duration::from_secs(DEFAULT_BACKGROUND_BUDGET_SECS))
    }

    pub fn location_enabled_or_default(&self) -> bool {
        self.location
            .as_ref()
            .and_then(|l| l.enabled)
            .unwrap_or(false)
    }

    pub fn location_mode_or_default(&self) -> LocationMode {
        self.location
            .as_ref()
            .and_then(|l| l.mode.as_deref())
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn location_accuracy_or_default(&self) -> LocationAccuracy {
        self.location
            .as_ref()
            .and_then(|l| l.accuracy.as_deref())
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn location_time_interval_or_default(&self) -> Duration {
        parse_duration(&self.location.as_ref().and_then(|l| l.time_interval.clone()))
            .unwrap_or(Duration::from_secs(DEFAULT_LOCATION_INTERVAL_SECS))
    }

    pub fn location_distance_interval_or_default(&self) -> f64 {
        self.location
            .as_ref()
            .and_then(|l| l.distance_interval)
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(DEFAULT_LOCATION_DISTANCE_M)
    }

    /// Location source. A fixed source needs both coordinates; otherwise IP lookup is used.
    pub fn location_source_or_default(&self) -> LocationSourceKind {
        let location = self.location.as_ref();
        let wants_fixed = location
            .and_then(|l| l.source.as_deref())
            .map(|s| s.eq_ignore_ascii_case("fixed"))
            .unwrap_or(false);

        if wants_fixed {
            if let Some((latitude, longitude)) =
                location.and_then(|l| l.latitude.zip(l.longitude))
            {
                return LocationSourceKind::Fixed {
                    latitude,
                    longitude,
                };
            }
        }

        LocationSourceKind::Ip {
            endpoint: location
                .and_then(|l| l.endpoint.clone())
                .unwrap_or_else(|| DEFAULT_LOCATION_ENDPOINT.to_string()),
        }
    }

    /// Microphone consent, granted unless explicitly denied
    pub fn microphone_permission(&self) -> PermissionStatus {
        match self
            .permissions
            .as_ref()
            .and_then(|p| p.microphone.as_deref())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("denied") => PermissionStatus::Denied,
            Some("granted") | None => PermissionStatus::Granted,
            Some(_) => PermissionStatus::Undetermined,
        }
    }

    /// Location consent, foreground-only unless configured otherwise
    pub fn location_grant(&self) -> LocationGrant {
        match self
            .permissions
            .as_ref()
            .and_then(|p| p.location.as_deref())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("denied") => LocationGrant::Denied,
            Some("background") => LocationGrant::Background,
            _ => LocationGrant::Foreground,
        }
    }
}

fn parse_duration(value: &Option<String>) -> Option<Duration> {
    value.as_ref().and_then(|s| s.parse().ok())
}

fn merge_section<T>(base: Option<T>, other: Option<T>, both: impl FnOnce(T, T) -> T) -> Option<T> {
    match (base, other) {
        (None, None) => None,
        (Some(b), None) => Some(b),
        (None, Some(o)) => Some(o),
        (Some(b), Some(o)) => Some(both(b, o)),
    }
}
