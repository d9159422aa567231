//! Playback session state

use std::fmt;
use std::path::{Path, PathBuf};

/// Playback states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
}

impl PlaybackState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single playback slot.
///
/// Each `begin` hands out a fresh generation number so completion
/// notifications from an earlier playback can be told apart.
#[derive(Debug, Default)]
pub struct PlaybackSession {
    target: Option<PathBuf>,
    generation: u64,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        if self.target.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    pub fn is_playing(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    /// Generation of the current (or most recent) playback
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Generation the next `begin` will use
    pub fn next_generation(&self) -> u64 {
        self.generation + 1
    }

    /// Enter PLAYING for `target`, returning its generation
    pub fn begin(&mut self, target: impl Into<PathBuf>) -> u64 {
        self.generation += 1;
        self.target = Some(target.into());
        self.generation
    }

    /// Return to IDLE
    pub fn end(&mut self) -> Option<PathBuf> {
        self.target.take()
    }

    /// Return to IDLE only if `generation` is the live playback.
    /// Returns whether anything changed.
    pub fn finish(&mut self, generation: u64) -> bool {
        if self.is_playing() && generation == self.generation {
            self.target = None;
            true
        } else {
            false
        }
    }
}
