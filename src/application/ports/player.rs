//! Audio playback port interfaces

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("Audio output device not available: {0}")]
    DeviceNotAvailable(String),

    #[error("Failed to open {path}: {message}")]
    OpenFailed { path: String, message: String },

    #[error("Failed to stop playback: {0}")]
    StopFailed(String),
}

/// Notifications a player sends about a playback it started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The stream reached its natural end
    Finished { generation: u64 },
    /// The stream stopped on a device or decode error
    Failed { generation: u64, message: String },
}

impl PlaybackEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Finished { generation } | Self::Failed { generation, .. } => *generation,
        }
    }
}

/// Channel end a player uses to report on one playback
#[derive(Debug, Clone)]
pub struct PlaybackEventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<PlaybackEvent>,
}

impl PlaybackEventSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<PlaybackEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report end-of-stream. A closed receiver is not an error.
    pub fn finished(&self) {
        let _ = self.tx.send(PlaybackEvent::Finished {
            generation: self.generation,
        });
    }

    pub fn failed(&self, message: impl Into<String>) {
        let _ = self.tx.send(PlaybackEvent::Failed {
            generation: self.generation,
            message: message.into(),
        });
    }
}

/// Port for audio playback
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Open `path` and start playing it.
    ///
    /// # Arguments
    /// * `path` - The audio file to play
    /// * `events` - Where to report end-of-stream for this playback
    async fn open(
        &self,
        path: &Path,
        events: PlaybackEventSink,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError>;
}

/// A live playback. Dropping it also stops the sound.
pub trait PlaybackHandle: Send {
    /// Halt playback and release the output device.
    /// No end-of-stream event is sent after a stop.
    fn stop(&mut self) -> Result<(), PlaybackError>;
}
