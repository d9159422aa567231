//! Playback domain module

mod session;

pub use session::{PlaybackSession, PlaybackState};
