//! Application layer - Use cases and port interfaces
//!
//! Contains the core recorder operations and trait definitions
//! for external system interactions.

pub mod background;
pub mod observers;
pub mod playback;
pub mod ports;
pub mod recorder;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

// Re-export use cases
pub use background::{
    BackgroundCaptureConfig, BackgroundJob, BackgroundRecordingTask, CycleOutcome, TaskOptions,
    TaskRegistry, TaskReport, BACKGROUND_RECORDING_TASK,
};
pub use observers::{
    observe_battery, observe_location, observe_storage, LocationOptions, LocationTracking,
    Observer, ObserverError, Reading,
};
pub use playback::{PlaybackControlError, PlaybackController};
pub use recorder::{RecorderConfig, RecorderError, RecordingService};
pub use store::{RecordingsStore, StoreError};
