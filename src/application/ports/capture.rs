//! Audio capture port interfaces

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::capture::{AudioMode, CapturePreset};

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoInputDevice,

    #[error("Audio mode rejected: {0}")]
    ModeRejected(String),

    #[error("Failed to open capture: {0}")]
    OpenFailed(String),

    #[error("Failed to pause capture: {0}")]
    PauseFailed(String),

    #[error("Failed to resume capture: {0}")]
    ResumeFailed(String),

    #[error("Failed to finalize capture: {0}")]
    FinalizeFailed(String),
}

/// Port for opening audio captures
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Configure the audio session before a capture is opened.
    async fn set_mode(&self, mode: AudioMode) -> Result<(), CaptureError>;

    /// Open a capture handle and start recording immediately.
    ///
    /// # Arguments
    /// * `preset` - Quality preset for the finalized file
    ///
    /// # Returns
    /// A live capture handle or an error
    async fn open(&self, preset: CapturePreset) -> Result<Box<dyn CaptureHandle>, CaptureError>;
}

/// An open, in-progress capture.
///
/// Dropping a handle without calling `finish` releases the device and
/// discards whatever was captured.
#[async_trait]
pub trait CaptureHandle: Send {
    /// Suspend capture without closing the device
    async fn pause(&mut self) -> Result<(), CaptureError>;

    /// Continue a suspended capture
    async fn resume(&mut self) -> Result<(), CaptureError>;

    /// Finalize and close the capture.
    ///
    /// # Returns
    /// The temporary file holding the recording
    async fn finish(&mut self) -> Result<PathBuf, CaptureError>;
}
