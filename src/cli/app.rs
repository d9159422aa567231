//! Command runners for the interactive commands

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::application::ports::{ConfigStore, PlaybackEvent, RecordingFiles};
use crate::application::{PlaybackController, RecorderConfig, RecordingService, RecordingsStore};
use crate::domain::config::AppConfig;
use crate::domain::recording::SessionState;
use crate::infrastructure::{
    create_notifier, ConfigPermissions, CpalCapture, LocalFiles, RodioPlayer, XdgConfigStore,
};

use super::presenter::{format_size, Presenter};
use super::signals::ShutdownSignal;
use super::status::StatusObservers;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding the recordings directory
pub const DIR_ENV: &str = "POCKET_RECORDER_DIR";

/// How long a one-shot `status` waits for the first readings
const STATUS_SETTLE_LIMIT: StdDuration = StdDuration::from_secs(3);

/// A key command typed while recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKey {
    TogglePause,
    Stop,
}

/// Map one line of stdin to a key command
pub fn parse_key(line: &str) -> Option<RecordKey> {
    match line.trim().to_lowercase().as_str() {
        "p" => Some(RecordKey::TogglePause),
        "s" | "" => Some(RecordKey::Stop),
        _ => None,
    }
}

/// Forward stdin lines as key commands.
///
/// Uses a plain thread since a pending stdin read cannot be cancelled and
/// would hold up runtime shutdown.
fn spawn_key_reader() -> mpsc::UnboundedReceiver<RecordKey> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        loop {
            line.clear();
            match std::io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if let Some(key) = parse_key(&line) {
                        if tx.send(key).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });
    rx
}

/// Record one clip interactively
pub async fn run_record(config: AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();

    let shutdown = Arc::new(ShutdownSignal::new());
    if let Err(e) = shutdown.setup(false).await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let recorder_config = RecorderConfig {
        dir: config.recordings_dir_or_default(),
        preset: config.quality_or_default(),
        tick: config.tick_or_default(),
    };
    let tick = recorder_config.tick;
    let files = Arc::new(LocalFiles::new());
    let mut service = RecordingService::new(
        Arc::new(CpalCapture::new()),
        Arc::clone(&files),
        Arc::new(ConfigPermissions::from_config(&config)),
        recorder_config,
    );

    if let Err(e) = service.start().await {
        presenter.error(&format!("Could not start recording: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let line = presenter.format_recording(service.state(), service.elapsed());
    presenter.start_spinner(&line);
    let mut keys = spawn_key_reader();
    let mut keys_open = true;
    let mut ticker = time::interval(tick.as_std());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => presenter.update_recording(service.state(), service.elapsed()),
            key = keys.recv(), if keys_open => match key {
                Some(RecordKey::TogglePause) => {
                    let result = if service.state() == SessionState::Paused {
                        service.resume().await
                    } else {
                        service.pause().await
                    };
                    if let Err(e) = result {
                        presenter.spinner_fail("Recording aborted");
                        presenter.error(&e.to_string());
                        return ExitCode::from(EXIT_ERROR);
                    }
                    presenter.update_recording(service.state(), service.elapsed());
                }
                Some(RecordKey::Stop) => break,
                None => {
                    debug!("stdin closed, stop with Ctrl-C");
                    keys_open = false;
                }
            },
            _ = shutdown.wait() => break,
        }
    }

    let elapsed = service.elapsed();
    match service.stop().await {
        Ok(Some(path)) => {
            let size = files
                .size(&path)
                .await
                .map(format_size)
                .unwrap_or_else(|_| "?".to_string());
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            presenter.spinner_success(&format!(
                "Saved {} ({}, {})",
                name,
                elapsed.stopwatch(),
                size
            ));
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(None) => {
            presenter.spinner_fail("Nothing saved");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.spinner_fail("Recording not saved");
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn open_store(config: &AppConfig) -> RecordingsStore<LocalFiles> {
    RecordingsStore::new(Arc::new(LocalFiles::new()), config.recordings_dir_or_default())
}

/// Print the saved recordings
pub async fn run_list(config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let mut store = open_store(&config);
    match store.load().await {
        Ok(entries) => {
            presenter.entries(entries);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Change a recording's title
pub async fn run_rename(config: AppConfig, filename: &str, title: &str) -> ExitCode {
    let presenter = Presenter::new();
    let mut store = open_store(&config);
    if let Err(e) = store.load().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    match store.rename(filename, title).await {
        Ok(()) => {
            presenter.success(&format!("Renamed {} to \"{}\"", filename, title.trim()));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Delete a recording and its file
pub async fn run_delete(config: AppConfig, filename: &str) -> ExitCode {
    let presenter = Presenter::new();
    let mut store = open_store(&config);
    if let Err(e) = store.load().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    match store.remove(filename).await {
        Ok(()) => {
            presenter.success(&format!("Deleted {}", filename));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Play a recording until it ends or Ctrl-C
pub async fn run_play(config: AppConfig, filename: &str) -> ExitCode {
    let mut presenter = Presenter::new();
    let mut store = open_store(&config);
    if let Err(e) = store.load().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    let Some(entry) = store.get(filename) else {
        presenter.error(&format!("Unknown recording: {}", filename));
        return ExitCode::from(EXIT_ERROR);
    };
    let title = entry.title().to_string();
    let path = entry.path().to_path_buf();

    let shutdown = Arc::new(ShutdownSignal::new());
    if let Err(e) = shutdown.setup(false).await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let mut controller = PlaybackController::new(Arc::new(RodioPlayer::new()));
    if let Err(e) = controller.play(path).await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    presenter.start_spinner(&format!("Playing {}", title));

    tokio::select! {
        event = controller.next_event() => match event {
            PlaybackEvent::Finished { .. } => {
                presenter.spinner_success(&format!("Played {}", title));
                ExitCode::from(EXIT_SUCCESS)
            }
            PlaybackEvent::Failed { message, .. } => {
                presenter.spinner_fail("Playback failed");
                presenter.error(&message);
                ExitCode::from(EXIT_ERROR)
            }
        },
        _ = shutdown.wait() => {
            let _ = controller.stop();
            presenter.stop_spinner();
            presenter.info("Playback stopped");
            ExitCode::from(EXIT_SUCCESS)
        }
    }
}

/// Show battery, storage and location once, or live with `watch`
pub async fn run_status(config: AppConfig, watch: bool) -> ExitCode {
    let presenter = Presenter::new();
    let permissions = ConfigPermissions::from_config(&config);
    let notifier = create_notifier(config.notify_or_default());
    let dir = config.recordings_dir_or_default();

    let mut observers = StatusObservers::start(
        &config,
        Arc::new(LocalFiles::new()),
        &dir,
        &permissions,
        &notifier,
    )
    .await;

    if !watch {
        observers.settle(STATUS_SETTLE_LIMIT).await;
        observers.print(&presenter);
        observers.stop();
        return ExitCode::from(EXIT_SUCCESS);
    }

    let shutdown = Arc::new(ShutdownSignal::new());
    if let Err(e) = shutdown.setup(false).await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    observers.print(&presenter);
    loop {
        tokio::select! {
            _ = observers.changed() => {
                presenter.output("");
                observers.print(&presenter);
            }
            _ = shutdown.wait() => break,
        }
    }
    observers.stop();
    ExitCode::from(EXIT_SUCCESS)
}

/// Config from the environment
fn env_config() -> AppConfig {
    AppConfig {
        recordings_dir: env::var(DIR_ENV).ok().filter(|s| !s.trim().is_empty()),
        ..Default::default()
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}
