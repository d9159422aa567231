//! Microphone capture using cpal
//!
//! The cpal stream is not `Send`, so each capture owns a dedicated thread
//! that builds the stream, keeps it alive and drops it on stop. Samples are
//! collected as mono i16 and written to a temporary WAV file on finish.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use chrono::Local;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::wav;
use crate::application::ports::{AudioCapture, CaptureError, CaptureHandle};
use crate::domain::capture::{AudioMode, CapturePreset, CAPTURE_EXTENSION};

/// How often the capture thread checks for a stop request
const STOP_POLL: std::time::Duration = std::time::Duration::from_millis(20);

type SampleBuffer = Arc<Mutex<Vec<i16>>>;

/// Audio capture from the default input device
pub struct CpalCapture {
    temp_dir: PathBuf,
}

impl CpalCapture {
    /// Capture into temporary files under the system temp directory
    pub fn new() -> Self {
        Self::with_temp_dir(std::env::temp_dir())
    }

    pub fn with_temp_dir(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }

    fn input_device() -> Result<cpal::Device, CaptureError> {
        cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)
    }

    /// Pick an input configuration, preferring `preferred_rate` when the
    /// device supports it and fewer channels otherwise
    fn input_config(
        device: &cpal::Device,
        preferred_rate: Option<u32>,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let Some(target) = preferred_rate else {
            let config = device
                .default_input_config()
                .map_err(|e| CaptureError::OpenFailed(format!("No default config: {}", e)))?;
            return Ok((config.config(), config.sample_format()));
        };

        let supported = device
            .supported_input_configs()
            .map_err(|e| CaptureError::OpenFailed(format!("Failed to get configs: {}", e)))?;

        let mut best: Option<cpal::SupportedStreamConfigRange> = None;
        for config in supported {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let includes_target =
                config.min_sample_rate().0 <= target && config.max_sample_rate().0 >= target;

            let is_better = match &best {
                None => true,
                Some(current) => {
                    let fewer_channels = config.channels() < current.channels();
                    let better_rate = includes_target && current.min_sample_rate().0 > target;
                    fewer_channels || better_rate
                }
            };
            if is_better {
                best = Some(config);
            }
        }

        let range = best.ok_or_else(|| CaptureError::OpenFailed("No suitable config found".into()))?;
        let sample_rate = if range.min_sample_rate().0 <= target && range.max_sample_rate().0 >= target {
            SampleRate(target)
        } else {
            range.min_sample_rate()
        };

        Ok((
            StreamConfig {
                channels: range.channels(),
                sample_rate,
                buffer_size: cpal::BufferSize::Default,
            },
            range.sample_format(),
        ))
    }

    /// Build and start the input stream. Runs on the capture thread.
    fn build_stream(
        preset: CapturePreset,
        buffer: SampleBuffer,
        paused: Arc<AtomicBool>,
    ) -> Result<(cpal::Stream, u32), CaptureError> {
        let device = Self::input_device()?;
        let (config, sample_format) = Self::input_config(&device, preset.target_sample_rate())?;
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        let on_error = |err: cpal::StreamError| warn!(error = %err, "audio input stream error");

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if !paused.load(Ordering::SeqCst) {
                        if let Ok(mut buffer) = buffer.lock() {
                            buffer.extend(wav::downmix(data, channels));
                        }
                    }
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !paused.load(Ordering::SeqCst) {
                        let samples = wav::f32_to_i16(data);
                        if let Ok(mut buffer) = buffer.lock() {
                            buffer.extend(wav::downmix(&samples, channels));
                        }
                    }
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::OpenFailed(format!(
                    "Unsupported sample format: {other:?}"
                )))
            }
        }
        .map_err(|e| CaptureError::OpenFailed(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::OpenFailed(e.to_string()))?;
        Ok((stream, sample_rate))
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioCapture for CpalCapture {
    async fn set_mode(&self, mode: AudioMode) -> Result<(), CaptureError> {
        // Desktop audio has no session category; only the intent is checked
        if !mode.allows_recording {
            return Err(CaptureError::ModeRejected(
                "audio mode does not allow recording".to_string(),
            ));
        }
        debug!(?mode, "audio mode set");
        Ok(())
    }

    async fn open(&self, preset: CapturePreset) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        let buffer: SampleBuffer = Arc::new(Mutex::new(Vec::new()));
        let paused = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread = {
            let buffer = Arc::clone(&buffer);
            let paused = Arc::clone(&paused);
            let running = Arc::clone(&running);
            std::thread::spawn(move || {
                let stream = match Self::build_stream(preset, buffer, paused) {
                    Ok((stream, sample_rate)) => {
                        let _ = ready_tx.send(Ok(sample_rate));
                        stream
                    }
                    Err(e) => {
                        running.store(false, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while running.load(Ordering::SeqCst) {
                    std::thread::sleep(STOP_POLL);
                }
                drop(stream);
            })
        };

        let device_rate = ready_rx
            .await
            .map_err(|_| CaptureError::OpenFailed("capture thread exited".to_string()))??;
        debug!(device_rate, preset = %preset, "capture opened");

        Ok(Box::new(CpalCaptureHandle {
            buffer,
            paused,
            running,
            thread: Some(thread),
            device_rate,
            preset,
            temp_dir: self.temp_dir.clone(),
        }))
    }
}

/// A live cpal capture
struct CpalCaptureHandle {
    buffer: SampleBuffer,
    paused: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    device_rate: u32,
    preset: CapturePreset,
    temp_dir: PathBuf,
}

impl CpalCaptureHandle {
    fn ensure_running(&self, fail: fn(String) -> CaptureError) -> Result<(), CaptureError> {
        if self.running.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(fail("input stream is closed".to_string()))
        }
    }

    /// Stop the stream thread and wait for it to release the device
    async fn close(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let joined = tokio::task::spawn_blocking(move || thread.join()).await;
            if !matches!(joined, Ok(Ok(()))) {
                warn!("capture thread did not shut down cleanly");
            }
        }
    }
}

#[async_trait]
impl CaptureHandle for CpalCaptureHandle {
    async fn pause(&mut self) -> Result<(), CaptureError> {
        self.ensure_running(CaptureError::PauseFailed)?;
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), CaptureError> {
        self.ensure_running(CaptureError::ResumeFailed)?;
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn finish(&mut self) -> Result<PathBuf, CaptureError> {
        self.close().await;

        let samples = {
            let mut buffer = self
                .buffer
                .lock()
                .map_err(|_| CaptureError::FinalizeFailed("sample buffer poisoned".to_string()))?;
            std::mem::take(&mut *buffer)
        };
        if samples.is_empty() {
            return Err(CaptureError::FinalizeFailed(
                "No audio data captured".to_string(),
            ));
        }

        let device_rate = self.device_rate;
        let output_rate = self.preset.target_sample_rate().unwrap_or(device_rate);
        let path = self.temp_dir.join(format!(
            "capture-{}.{}",
            Local::now().timestamp_millis(),
            CAPTURE_EXTENSION
        ));

        let target = path.clone();
        tokio::task::spawn_blocking(move || {
            let pcm = wav::resample(&samples, device_rate, output_rate)?;
            wav::write_wav(&target, &pcm, output_rate)
        })
        .await
        .map_err(|e| CaptureError::FinalizeFailed(format!("Encode task error: {}", e)))??;

        debug!(path = %path.display(), "capture finalized");
        Ok(path)
    }
}

impl Drop for CpalCaptureHandle {
    fn drop(&mut self) {
        // The thread notices on its next poll and drops the stream
        self.running.store(false, Ordering::SeqCst);
    }
}
