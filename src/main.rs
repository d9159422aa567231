//! Pocket Recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pocket_recorder::cli::{
    app::{
        load_merged_config, run_delete, run_list, run_play, run_record, run_rename, run_status,
        EXIT_ERROR, EXIT_USAGE_ERROR,
    },
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    daemon_app::run_daemon,
    presenter::Presenter,
};
use pocket_recorder::domain::config::AppConfig;
use pocket_recorder::domain::recording::Duration;
use pocket_recorder::domain::CapturePreset;
use pocket_recorder::infrastructure::XdgConfigStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Config commands work on the file alone
    let command = match cli.command {
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        other => other,
    };

    // Build CLI config from args
    let mut cli_config = AppConfig {
        recordings_dir: cli.dir.clone(),
        notify: if cli.notify { Some(true) } else { None },
        ..Default::default()
    };
    if let Commands::Record { quality, tick } = &command {
        if let Some(tick) = tick {
            match tick.parse::<Duration>() {
                Ok(d) if d.is_valid_tick() => cli_config.tick = Some(tick.clone()),
                Ok(_) => {
                    presenter.error("Invalid tick: must be between 50ms and 1s");
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
                Err(e) => {
                    presenter.error(&format!("Invalid tick: {}", e));
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
            }
        }
        cli_config.quality = quality.map(|q| CapturePreset::from(q).as_str().to_string());
    }

    // Merge config
    let config = load_merged_config(cli_config).await;

    // Route to appropriate handler
    match command {
        Commands::Record { .. } => run_record(config).await,
        Commands::List => run_list(config).await,
        Commands::Play { filename } => run_play(config, &filename).await,
        Commands::Rename { filename, title } => run_rename(config, &filename, &title).await,
        Commands::Delete { filename } => run_delete(config, &filename).await,
        Commands::Status { watch } => run_status(config, watch).await,
        Commands::Daemon => run_daemon(config).await,
        Commands::Config { .. } => ExitCode::SUCCESS,
    }
}
