//! Shutdown signal handling (SIGINT/SIGTERM)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::Colorize;
use tokio::sync::watch;
use tracing::debug;

/// Which OS signal asked us to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
}

impl ShutdownReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        }
    }
}

/// Shutdown flag set from SIGINT or SIGTERM.
///
/// Cloned receivers let several loops await the same shutdown.
pub struct ShutdownSignal {
    shutdown: Arc<AtomicBool>,
    tx: watch::Sender<Option<ShutdownReason>>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            tx,
        }
    }

    /// Get a clone of the shutdown flag
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Request shutdown from inside the process
    pub fn trigger(&self, reason: ShutdownReason) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.tx.send_replace(Some(reason));
    }

    /// Resolve once shutdown has been requested
    pub async fn wait(&self) -> ShutdownReason {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(reason) = *rx.borrow_and_update() {
                return reason;
            }
            if rx.changed().await.is_err() {
                return ShutdownReason::Interrupt;
            }
        }
    }

    /// Install OS signal handlers that trigger this shutdown
    pub async fn setup(self: &Arc<Self>, announce: bool) -> Result<(), std::io::Error> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;
            let this = Arc::clone(self);
            tokio::spawn(async move {
                let reason = tokio::select! {
                    _ = sigint.recv() => ShutdownReason::Interrupt,
                    _ = sigterm.recv() => ShutdownReason::Terminate,
                };
                this.received(reason, announce);
            });
        }

        #[cfg(not(unix))]
        {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    this.received(ShutdownReason::Interrupt, announce);
                }
            });
        }

        Ok(())
    }

    fn received(&self, reason: ShutdownReason, announce: bool) {
        debug!(signal = reason.as_str(), "shutdown requested");
        if announce {
            eprintln!("{} Received {} (shutdown)", "↓".cyan(), reason.as_str());
        }
        self.trigger(reason);
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
