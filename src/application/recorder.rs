//! Interactive recording use case

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::capture::{AudioMode, CapturePreset};
use crate::domain::permission::PermissionKind;
use crate::domain::recording::{
    Duration, InvalidStateTransition, RecordingKind, RecordingSession, SessionState,
};

use super::ports::{
    AudioCapture, CaptureError, CaptureHandle, Permissions, RecordingFiles, StorageError,
};
use super::store::{discard_temp, store_capture};

/// Errors from the recording use case
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("{0}")]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Could not save recording: {0}")]
    Storage(#[from] StorageError),
}

/// Settings for interactive recording
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Managed directory finished recordings are moved into
    pub dir: PathBuf,
    /// Quality preset for new captures
    pub preset: CapturePreset,
    /// Resolution of the elapsed time display
    pub tick: Duration,
}

impl RecorderConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            preset: CapturePreset::default(),
            tick: Duration::default_tick(),
        }
    }
}

/// Drives one recording session against the capture port.
///
/// Every failing port call returns the session to IDLE and releases the
/// capture handle, so the caller never sees a half-open recording.
pub struct RecordingService<C, F, P>
where
    C: AudioCapture,
    F: RecordingFiles,
    P: Permissions,
{
    capture: Arc<C>,
    files: Arc<F>,
    permissions: Arc<P>,
    config: RecorderConfig,
    session: RecordingSession,
    handle: Option<Box<dyn CaptureHandle>>,
}

impl<C, F, P> RecordingService<C, F, P>
where
    C: AudioCapture,
    F: RecordingFiles,
    P: Permissions,
{
    pub fn new(capture: Arc<C>, files: Arc<F>, permissions: Arc<P>, config: RecorderConfig) -> Self {
        Self {
            capture,
            files,
            permissions,
            config,
            session: RecordingSession::new(),
            handle: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Elapsed recording time, quantized to the configured tick
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        self.session.elapsed_ticks(now, self.config.tick)
    }

    /// Start a new recording
    pub async fn start(&mut self) -> Result<(), RecorderError> {
        self.session.ensure_can_start()?;

        if !self
            .permissions
            .request(PermissionKind::Microphone)
            .await
            .is_granted()
        {
            warn!("microphone permission refused");
            return Err(RecorderError::PermissionDenied);
        }

        self.capture.set_mode(AudioMode::recording()).await?;
        let handle = self.capture.open(self.config.preset).await?;

        self.handle = Some(handle);
        self.session.start(Instant::now())?;
        info!(preset = %self.config.preset, "recording started");
        Ok(())
    }

    /// Suspend the capture, keeping the device open
    pub async fn pause(&mut self) -> Result<(), RecorderError> {
        self.session.ensure_can_pause()?;
        let result = match self.handle.as_mut() {
            Some(handle) => handle.pause().await,
            None => Err(CaptureError::PauseFailed("no open capture".to_string())),
        };
        if let Err(e) = result {
            self.abort("pause", &e);
            return Err(e.into());
        }
        self.session.pause(Instant::now())?;
        debug!("recording paused");
        Ok(())
    }

    /// Continue a paused capture
    pub async fn resume(&mut self) -> Result<(), RecorderError> {
        self.session.ensure_can_resume()?;
        let result = match self.handle.as_mut() {
            Some(handle) => handle.resume().await,
            None => Err(CaptureError::ResumeFailed("no open capture".to_string())),
        };
        if let Err(e) = result {
            self.abort("resume", &e);
            return Err(e.into());
        }
        self.session.resume(Instant::now())?;
        debug!("recording resumed");
        Ok(())
    }

    /// Finish the recording and move it into the managed directory.
    ///
    /// # Returns
    /// The stored file, or None when nothing was being recorded
    pub async fn stop(&mut self) -> Result<Option<PathBuf>, RecorderError> {
        let Some(mut handle) = self.handle.take() else {
            debug!("stop with no open capture");
            return Ok(None);
        };
        let recorded = self.session.stop(Instant::now())?;

        let temp = match handle.finish().await {
            Ok(temp) => temp,
            Err(e) => {
                warn!(error = %e, "finalize failed");
                return Err(e.into());
            }
        };
        drop(handle);

        match store_capture(
            self.files.as_ref(),
            &self.config.dir,
            RecordingKind::Interactive,
            &temp,
        )
        .await
        {
            Ok(path) => {
                info!(
                    path = %path.display(),
                    duration = %Duration::from(recorded),
                    "recording saved"
                );
                Ok(Some(path))
            }
            Err(e) => {
                warn!(error = %e, "could not move recording into place");
                Err(e.into())
            }
        }
    }

    /// Throw away the current recording without saving it
    pub async fn cancel(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Ok(temp) = handle.finish().await {
                discard_temp(self.files.as_ref(), &temp).await;
            }
        }
        self.session.abort(Instant::now());
        debug!("recording cancelled");
    }

    fn abort(&mut self, action: &str, error: &CaptureError) {
        warn!(action, error = %error, "capture failed, returning to idle");
        self.handle = None;
        self.session.abort(Instant::now());
    }
}
