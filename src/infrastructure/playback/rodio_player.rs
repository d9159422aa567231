//! Rodio-based playback adapter
//!
//! The output stream is not `Send`, so each playback runs on its own thread
//! that owns the stream and waits for the sink to drain. The sink itself is
//! shared with the handle so `stop` can interrupt it.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::oneshot;
use tracing::debug;

use crate::application::ports::{AudioPlayer, PlaybackError, PlaybackEventSink, PlaybackHandle};

/// Audio playback on the default output device
pub struct RodioPlayer;

impl RodioPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioPlayer for RodioPlayer {
    async fn open(
        &self,
        path: &Path,
        events: PlaybackEventSink,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        let path = path.to_path_buf();
        let stopped = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = oneshot::channel();

        {
            let stopped = Arc::clone(&stopped);
            std::thread::spawn(move || {
                let (_stream, sink) = match start_playback(&path) {
                    Ok(started) => started,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let sink = Arc::new(sink);
                let _ = ready_tx.send(Ok(Arc::clone(&sink)));

                sink.sleep_until_end();
                if !stopped.load(Ordering::SeqCst) {
                    debug!(path = %path.display(), "end of stream");
                    events.finished();
                }
            });
        }

        let sink = ready_rx
            .await
            .map_err(|_| PlaybackError::DeviceNotAvailable("playback thread exited".to_string()))??;

        Ok(Box::new(RodioPlaybackHandle { sink, stopped }))
    }
}

/// Open the output device and queue `path`. Runs on the playback thread.
fn start_playback(path: &PathBuf) -> Result<(OutputStream, Sink), PlaybackError> {
    let open_failed = |message: String| PlaybackError::OpenFailed {
        path: path.display().to_string(),
        message,
    };

    let file = File::open(path).map_err(|e| open_failed(e.to_string()))?;
    let source = Decoder::new(BufReader::new(file)).map_err(|e| open_failed(e.to_string()))?;

    let (stream, stream_handle) = OutputStream::try_default()
        .map_err(|e| PlaybackError::DeviceNotAvailable(e.to_string()))?;
    let sink = Sink::try_new(&stream_handle)
        .map_err(|e| PlaybackError::DeviceNotAvailable(e.to_string()))?;
    sink.append(source);

    Ok((stream, sink))
}

/// A live rodio playback
struct RodioPlaybackHandle {
    sink: Arc<Sink>,
    stopped: Arc<AtomicBool>,
}

impl PlaybackHandle for RodioPlaybackHandle {
    fn stop(&mut self) -> Result<(), PlaybackError> {
        self.stopped.store(true, Ordering::SeqCst);
        self.sink.stop();
        Ok(())
    }
}

impl Drop for RodioPlaybackHandle {
    fn drop(&mut self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.sink.stop();
        }
    }
}
