//! CLI presenter for output formatting

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::Reading;
use crate::domain::recording::{Duration, RecordingEntry, RecordingKind, SessionState};
use crate::domain::status::{BatteryReading, LocationFix, StorageReading};

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Live line shown while a session is active
    pub fn format_recording(&self, state: SessionState, elapsed: Duration) -> String {
        let label = match state {
            SessionState::Recording => "Recording".red().bold(),
            SessionState::Paused => "Paused".yellow().bold(),
            SessionState::Idle => "Idle".normal(),
        };
        format!(
            "{} {}  {}",
            label,
            elapsed.stopwatch(),
            "[p] pause/resume  [s] stop".dimmed()
        )
    }

    /// Update the live recording line
    pub fn update_recording(&self, state: SessionState, elapsed: Duration) {
        self.update_spinner(&self.format_recording(state, elapsed));
    }

    /// One line of the recordings list
    pub fn format_entry(&self, entry: &RecordingEntry) -> String {
        let size = entry
            .size()
            .map(format_size)
            .unwrap_or_else(|| "?".to_string());
        let marker = match entry.kind() {
            Some(RecordingKind::Background) => " (background)".dimmed().to_string(),
            _ => String::new(),
        };
        format!(
            "{}{}  {}  {}",
            entry.title().bold(),
            marker,
            size.cyan(),
            entry.filename().dimmed()
        )
    }

    /// Print the recordings list to stdout
    pub fn entries(&self, entries: &[RecordingEntry]) {
        if entries.is_empty() {
            self.info("No recordings yet");
            return;
        }
        for entry in entries {
            println!("{}", self.format_entry(entry));
        }
    }

    /// Print one status line per observed value
    pub fn status(
        &self,
        battery: &Reading<BatteryReading>,
        storage: &Reading<StorageReading>,
        location: Option<&Reading<LocationFix>>,
    ) {
        for line in format_status(battery, storage, location) {
            println!("{}", line);
        }
    }

    /// Print daemon status
    pub fn daemon_status(&self, state: &str) {
        eprintln!("{} Daemon: {}", "●".cyan(), state);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Human readable byte count: B, KB or MB with one decimal
pub fn format_size(bytes: u64) -> String {
    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

fn format_reading<T: ToString>(reading: &Reading<T>, waiting: &str) -> String {
    match reading {
        Reading::Waiting => waiting.to_string(),
        Reading::Value(value) => value.to_string(),
        Reading::Unavailable(e) => format!("unavailable ({})", e),
    }
}

/// Status lines for battery, storage and, when tracked, location
pub fn format_status(
    battery: &Reading<BatteryReading>,
    storage: &Reading<StorageReading>,
    location: Option<&Reading<LocationFix>>,
) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", "Battery:".cyan(), format_reading(battery, "...")),
        format!("{} {}", "Storage:".cyan(), format_reading(storage, "...")),
    ];
    if let Some(location) = location {
        lines.push(format!(
            "{} {}",
            "Location:".cyan(),
            format_reading(location, "Waiting for location...")
        ));
    }
    lines
}
