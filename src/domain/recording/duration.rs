//! Duration value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default elapsed-time display tick (100 milliseconds)
pub const DEFAULT_TICK_MS: u64 = 100;

/// Allowed tick range for the elapsed-time display
pub const MIN_TICK_MS: u64 = 50;
pub const MAX_TICK_MS: u64 = 1000;

/// Default length of one background capture (30 seconds)
pub const DEFAULT_BACKGROUND_CAPTURE_SECS: u64 = 30;

/// Default minimum interval between background captures (60 seconds)
pub const DEFAULT_BACKGROUND_INTERVAL_SECS: u64 = 60;

/// Default free-storage polling interval (60 seconds)
pub const DEFAULT_STORAGE_POLL_SECS: u64 = 60;

/// Value object representing a time duration.
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// Default elapsed-time tick
    pub const fn default_tick() -> Self {
        Self::from_millis(DEFAULT_TICK_MS)
    }

    /// Default background capture length
    pub const fn default_background_capture() -> Self {
        Self::from_secs(DEFAULT_BACKGROUND_CAPTURE_SECS)
    }

    /// Default background scheduling interval
    pub const fn default_background_interval() -> Self {
        Self::from_secs(DEFAULT_BACKGROUND_INTERVAL_SECS)
    }

    /// Default storage polling interval
    pub const fn default_storage_poll() -> Self {
        Self::from_secs(DEFAULT_STORAGE_POLL_SECS)
    }

    /// Get duration in seconds
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Get duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }

    /// Whether this duration is usable as an elapsed-time tick
    pub const fn is_valid_tick(&self) -> bool {
        self.milliseconds >= MIN_TICK_MS && self.milliseconds <= MAX_TICK_MS
    }

    /// Format as a stopwatch reading: `m:ss.d`
    pub fn stopwatch(&self) -> String {
        let total_secs = self.milliseconds / 1000;
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        let tenths = (self.milliseconds % 1000) / 100;
        format!("{}:{:02}.{}", minutes, seconds, tenths)
    }
}

impl From<StdDuration> for Duration {
    fn from(d: StdDuration) -> Self {
        Self::from_millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse a duration string into a Duration value object.
    /// Supported formats: "250ms", "30s", "1m", "2m30s", "1s500ms"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let err = || DurationParseError {
            input: s.to_string(),
        };

        let mut total_ms: u64 = 0;
        let mut current_num = String::new();
        let mut found_any = false;
        let mut chars = input.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch.is_ascii_digit() {
                current_num.push(ch);
                continue;
            }
            if current_num.is_empty() {
                return Err(err());
            }
            let value: u64 = current_num.parse().map_err(|_| err())?;
            let unit_ms = match ch {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    1
                }
                'm' => 60_000,
                's' => 1000,
                _ => return Err(err()),
            };
            total_ms = value
                .checked_mul(unit_ms)
                .and_then(|v| total_ms.checked_add(v))
                .ok_or_else(err)?;
            current_num.clear();
            found_any = true;
        }

        // Leftover digits without a unit
        if !current_num.is_empty() || !found_any || total_ms == 0 {
            return Err(err());
        }

        Ok(Self {
            milliseconds: total_ms,
        })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.milliseconds % 1000;
        let total_secs = self.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;

        let mut out = String::new();
        if minutes > 0 {
            out.push_str(&format!("{}m", minutes));
        }
        if seconds > 0 {
            out.push_str(&format!("{}s", seconds));
        }
        if millis > 0 || out.is_empty() {
            out.push_str(&format!("{}ms", millis));
        }
        write!(f, "{}", out)
    }
}
