//! Recording session state machine

use std::fmt;
use std::time::{Duration as StdDuration, Instant};

use thiserror::Error;

use super::Duration;

/// Recording session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Paused,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// Recording session entity.
/// Tracks state and elapsed time for the single live capture.
///
/// State machine:
///   IDLE -> RECORDING (start)
///   RECORDING -> PAUSED (pause)
///   PAUSED -> RECORDING (resume)
///   RECORDING | PAUSED -> IDLE (stop)
///
/// Elapsed time only accumulates while RECORDING. Every transition takes the
/// instant it happens at, so the accounting is deterministic under test.
#[derive(Debug, Default)]
pub struct RecordingSession {
    state: SessionState,
    started_at: Option<Instant>,
    /// Time recorded before the current running stretch
    accumulated: StdDuration,
    /// Start of the current running stretch (Some only while RECORDING)
    running_since: Option<Instant>,
}

impl RecordingSession {
    /// Create a new idle session
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    /// When the current session was started
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Check that `start` is currently allowed without changing anything
    pub fn ensure_can_start(&self) -> Result<(), InvalidStateTransition> {
        self.require(SessionState::Idle, "start recording")
    }

    /// Transition from IDLE to RECORDING, resetting elapsed time
    pub fn start(&mut self, now: Instant) -> Result<(), InvalidStateTransition> {
        self.ensure_can_start()?;
        self.state = SessionState::Recording;
        self.started_at = Some(now);
        self.accumulated = StdDuration::ZERO;
        self.running_since = Some(now);
        Ok(())
    }

    /// Check that `pause` is currently allowed
    pub fn ensure_can_pause(&self) -> Result<(), InvalidStateTransition> {
        self.require(SessionState::Recording, "pause recording")
    }

    /// Transition from RECORDING to PAUSED, freezing elapsed time
    pub fn pause(&mut self, now: Instant) -> Result<(), InvalidStateTransition> {
        self.ensure_can_pause()?;
        self.fold_running(now);
        self.state = SessionState::Paused;
        Ok(())
    }

    /// Check that `resume` is currently allowed
    pub fn ensure_can_resume(&self) -> Result<(), InvalidStateTransition> {
        self.require(SessionState::Paused, "resume recording")
    }

    /// Transition from PAUSED to RECORDING
    pub fn resume(&mut self, now: Instant) -> Result<(), InvalidStateTransition> {
        self.ensure_can_resume()?;
        self.state = SessionState::Recording;
        self.running_since = Some(now);
        Ok(())
    }

    /// Check that `stop` is currently allowed
    pub fn ensure_can_stop(&self) -> Result<(), InvalidStateTransition> {
        match self.state {
            SessionState::Recording | SessionState::Paused => Ok(()),
            SessionState::Idle => Err(InvalidStateTransition {
                current_state: self.state,
                action: "stop recording".to_string(),
            }),
        }
    }

    /// Transition from RECORDING or PAUSED to IDLE.
    /// Returns the total recorded (unpaused) time.
    pub fn stop(&mut self, now: Instant) -> Result<StdDuration, InvalidStateTransition> {
        self.ensure_can_stop()?;
        self.fold_running(now);
        let total = self.accumulated;
        self.state = SessionState::Idle;
        self.started_at = None;
        Ok(total)
    }

    /// Force the session back to IDLE after a failed platform call.
    /// Elapsed time is kept frozen at its last value.
    pub fn abort(&mut self, now: Instant) {
        self.fold_running(now);
        self.state = SessionState::Idle;
        self.started_at = None;
    }

    /// Unpaused time recorded so far
    pub fn elapsed(&self, now: Instant) -> StdDuration {
        match self.running_since {
            Some(since) => self.accumulated + now.saturating_duration_since(since),
            None => self.accumulated,
        }
    }

    /// Elapsed time rounded down to a whole number of ticks
    pub fn elapsed_ticks(&self, now: Instant, tick: Duration) -> Duration {
        let elapsed_ms = u64::try_from(self.elapsed(now).as_millis()).unwrap_or(u64::MAX);
        let tick_ms = tick.as_millis().max(1);
        Duration::from_millis(elapsed_ms - elapsed_ms % tick_ms)
    }

    fn fold_running(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += now.saturating_duration_since(since);
        }
    }

    fn require(&self, expected: SessionState, action: &str) -> Result<(), InvalidStateTransition> {
        if self.state != expected {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        Ok(())
    }
}
