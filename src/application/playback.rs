//! Playback controller use case

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::playback::{PlaybackSession, PlaybackState};

use super::ports::{AudioPlayer, PlaybackError, PlaybackEvent, PlaybackEventSink, PlaybackHandle};

/// Errors from the playback controller
#[derive(Debug, Error)]
pub enum PlaybackControlError {
    #[error("Playback failed: {0}")]
    Player(#[from] PlaybackError),
}

/// Owns the single playback slot.
///
/// Player adapters report end-of-stream on a channel owned by the
/// controller; events from a playback that has since been replaced or
/// stopped are ignored. Pending events are applied by `next_event`,
/// `poll_events`, `play` and `stop`, so `state` only reflects a natural
/// end once one of those has run.
pub struct PlaybackController<A: AudioPlayer> {
    player: Arc<A>,
    session: PlaybackSession,
    handle: Option<Box<dyn PlaybackHandle>>,
    events_tx: mpsc::UnboundedSender<PlaybackEvent>,
    events_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
}

impl<A: AudioPlayer> PlaybackController<A> {
    pub fn new(player: Arc<A>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            player,
            session: PlaybackSession::new(),
            handle: None,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.session.state()
    }

    pub fn target(&self) -> Option<&Path> {
        self.session.target()
    }

    /// Start playing `path`, stopping whatever is playing first
    pub async fn play(&mut self, path: impl Into<PathBuf>) -> Result<(), PlaybackControlError> {
        let path = path.into();
        // The old handle is released even when its stop fails
        if let Err(e) = self.stop() {
            warn!(error = %e, "previous playback did not stop cleanly, starting anyway");
        }

        let generation = self.session.next_generation();
        let sink = PlaybackEventSink::new(generation, self.events_tx.clone());
        let handle = self.player.open(&path, sink).await.map_err(|e| {
            warn!(path = %path.display(), error = %e, "could not start playback");
            e
        })?;

        self.handle = Some(handle);
        let generation = self.session.begin(path);
        info!(generation, target = ?self.session.target(), "playback started");
        Ok(())
    }

    /// Halt the current playback. A no-op when idle.
    pub fn stop(&mut self) -> Result<(), PlaybackControlError> {
        self.poll_events();
        let Some(mut handle) = self.handle.take() else {
            self.session.end();
            return Ok(());
        };
        let target = self.session.end();
        let result = handle.stop();
        drop(handle);

        match result {
            Ok(()) => {
                debug!(target = ?target, "playback stopped");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "playback did not stop cleanly, handle released");
                Err(e.into())
            }
        }
    }

    /// Apply an event from the player.
    ///
    /// # Returns
    /// true if the event ended the live playback
    pub fn handle_event(&mut self, event: PlaybackEvent) -> bool {
        let generation = event.generation();
        if !self.session.finish(generation) {
            debug!(generation, "ignoring event from an earlier playback");
            return false;
        }
        self.handle = None;
        match event {
            PlaybackEvent::Finished { .. } => info!(generation, "playback finished"),
            PlaybackEvent::Failed { message, .. } => {
                warn!(generation, error = %message, "playback ended with an error")
            }
        }
        true
    }

    /// Apply every event already delivered without waiting.
    ///
    /// # Returns
    /// true if one of them ended the live playback
    pub fn poll_events(&mut self) -> bool {
        let mut ended = false;
        while let Ok(event) = self.events_rx.try_recv() {
            ended |= self.handle_event(event);
        }
        ended
    }

    /// Wait for the next player event and apply it.
    ///
    /// Returns the event once it has been applied. Waits forever while
    /// nothing is playing.
    pub async fn next_event(&mut self) -> PlaybackEvent {
        while let Some(event) = self.events_rx.recv().await {
            if self.handle_event(event.clone()) {
                return event;
            }
        }
        // Unreachable while the controller holds a sender
        std::future::pending().await
    }
}
