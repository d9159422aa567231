//! Recording domain module

mod duration;
mod entry;
mod session;

pub use duration::{
    Duration, DEFAULT_BACKGROUND_CAPTURE_SECS, DEFAULT_BACKGROUND_INTERVAL_SECS,
    DEFAULT_STORAGE_POLL_SECS, DEFAULT_TICK_MS, MAX_TICK_MS, MIN_TICK_MS,
};
pub use entry::{
    is_audio_file, RecordingEntry, RecordingKind, RecordingName, Title, AUDIO_EXTENSIONS,
};
pub use session::{InvalidStateTransition, RecordingSession, SessionState};
