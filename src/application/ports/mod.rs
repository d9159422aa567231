//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod notifier;
pub mod permissions;
pub mod player;
pub mod sensors;
pub mod storage;

// Re-export common types
pub use capture::{AudioCapture, CaptureError, CaptureHandle};
pub use config::ConfigStore;
pub use notifier::{NotificationError, NotificationIcon, Notifier};
pub use permissions::Permissions;
pub use player::{AudioPlayer, PlaybackError, PlaybackEvent, PlaybackEventSink, PlaybackHandle};
pub use sensors::{BatterySensor, LocationSource, SensorError};
pub use storage::{RecordingFiles, StorageError};
