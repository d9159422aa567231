//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! and the command runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod daemon_app;
pub mod presenter;
pub mod signals;
pub mod status;

// Re-export commonly used types
pub use app::{
    load_merged_config, run_delete, run_list, run_play, run_record, run_rename, run_status,
    EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction, QualityArg};
pub use daemon_app::run_daemon;
pub use presenter::Presenter;
