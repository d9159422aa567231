//! CLI argument definitions using Clap

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::capture::CapturePreset;

/// Pocket Recorder - record audio clips and manage saved recordings
#[derive(Parser, Debug)]
#[command(name = "pocket-recorder")]
#[command(version)]
#[command(about = "Record audio clips, watch device status and manage saved recordings")]
#[command(long_about = None)]
pub struct Cli {
    /// Recordings directory (overrides config and POCKET_RECORDER_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub dir: Option<String>,

    /// Show desktop notifications
    #[arg(short = 'n', long, global = true)]
    pub notify: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a clip (p: pause/resume, s or Enter: stop, Ctrl-C: stop)
    Record {
        /// Capture quality preset
        #[arg(short = 'q', long, value_name = "QUALITY")]
        quality: Option<QualityArg>,

        /// Elapsed display resolution (50ms to 1s)
        #[arg(long, value_name = "TIME")]
        tick: Option<String>,
    },
    /// List saved recordings, newest first
    List,
    /// Play a saved recording until it ends or Ctrl-C
    Play {
        /// Recording filename
        filename: String,
    },
    /// Change the title of a recording
    Rename {
        /// Recording filename
        filename: String,
        /// New title
        title: String,
    },
    /// Delete a recording and its file
    Delete {
        /// Recording filename
        filename: String,
    },
    /// Show battery, free storage and location
    Status {
        /// Keep updating until Ctrl-C
        #[arg(short = 'w', long)]
        watch: bool,
    },
    /// Run scheduled background recordings and status observers until shutdown
    Daemon,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Quality argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum QualityArg {
    High,
    Low,
}

impl From<QualityArg> for CapturePreset {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::High => CapturePreset::HighQuality,
            QualityArg::Low => CapturePreset::LowQuality,
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "recordings_dir",
    "tick",
    "quality",
    "notify",
    "storage_poll_interval",
    "battery_poll_interval",
    "background.enabled",
    "background.interval",
    "background.capture_duration",
    "background.budget",
    "location.enabled",
    "location.mode",
    "location.accuracy",
    "location.time_interval",
    "location.distance_interval",
    "location.source",
    "location.endpoint",
    "location.latitude",
    "location.longitude",
    "permissions.microphone",
    "permissions.location",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
