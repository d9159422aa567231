//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the audio devices, the file system, sysfs and HTTP.

pub mod capture;
pub mod config;
pub mod notification;
pub mod permissions;
pub mod playback;
pub mod sensors;
pub mod storage;

// Re-export adapters
pub use capture::CpalCapture;
pub use config::XdgConfigStore;
pub use notification::{create_notifier, NoOpNotifier, NotifyRustNotifier};
pub use permissions::ConfigPermissions;
pub use playback::RodioPlayer;
pub use sensors::{create_location_source, FixedLocationSource, IpLocationSource, SysfsBattery};
pub use storage::LocalFiles;
