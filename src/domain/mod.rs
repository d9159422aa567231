//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer talks to no device, file or network.

pub mod capture;
pub mod config;
pub mod error;
pub mod permission;
pub mod playback;
pub mod recording;
pub mod status;

// Re-export common types
pub use capture::{AudioMode, CapturePreset};
pub use config::AppConfig;
pub use error::*;
pub use permission::{PermissionKind, PermissionStatus};
pub use playback::{PlaybackSession, PlaybackState};
pub use recording::{Duration, RecordingEntry, RecordingKind, RecordingSession, SessionState};
pub use status::{BatteryReading, ChargingState, LocationFix, StorageReading};
