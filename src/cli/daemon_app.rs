//! Daemon app runner

use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::application::ports::RecordingFiles;
use crate::application::{
    BackgroundCaptureConfig, BackgroundRecordingTask, CycleOutcome, TaskOptions, TaskRegistry,
    TaskReport, BACKGROUND_RECORDING_TASK,
};
use crate::domain::config::AppConfig;
use crate::infrastructure::{create_notifier, ConfigPermissions, CpalCapture, LocalFiles};

use super::app::{EXIT_ERROR, EXIT_SUCCESS};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;
use super::status::StatusObservers;

/// Run daemon mode
pub async fn run_daemon(config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let shutdown = Arc::new(ShutdownSignal::new());
    if let Err(e) = shutdown.setup(true).await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let dir = config.recordings_dir_or_default();
    let files = Arc::new(LocalFiles::new());
    if let Err(e) = files.ensure_dir(&dir).await {
        presenter.error(&format!("Cannot use {}: {}", dir.display(), e));
        return ExitCode::from(EXIT_ERROR);
    }

    let permissions = Arc::new(ConfigPermissions::from_config(&config));
    let notifier = create_notifier(config.notify_or_default());
    let registry = TaskRegistry::global();
    let mut reports = registry.subscribe();

    let background = config.background_enabled_or_default();
    if background {
        let task = BackgroundRecordingTask::new(
            Arc::new(CpalCapture::new()),
            Arc::clone(&files),
            Arc::clone(&permissions),
            BackgroundCaptureConfig {
                dir: dir.clone(),
                capture_duration: config.background_capture_duration_or_default(),
                preset: config.quality_or_default(),
            },
        );
        let options = TaskOptions {
            minimum_interval: config.background_interval_or_default(),
            execution_budget: config.background_budget_or_default(),
        };
        if !registry.register(BACKGROUND_RECORDING_TASK, options, Arc::new(task)) {
            warn!(task = BACKGROUND_RECORDING_TASK, "task was already registered");
        }
        presenter.daemon_status(&format!(
            "Background recording every {} ({} clips)",
            options.minimum_interval,
            config.background_capture_duration_or_default()
        ));
    } else {
        presenter.info(
            "Background recording is off (pocket-recorder config set background.enabled true)",
        );
    }

    let mut observers =
        StatusObservers::start(&config, Arc::clone(&files), &dir, permissions.as_ref(), &notifier)
            .await;

    presenter.daemon_status("Started");
    presenter.info(&format!(
        "PID: {} | Recordings: {} | SIGINT/SIGTERM: exit",
        std::process::id(),
        dir.display()
    ));

    let mut reports_open = true;
    let reason = loop {
        tokio::select! {
            report = reports.recv(), if reports_open => match report {
                Ok(report) => present_report(&presenter, &report),
                Err(RecvError::Lagged(missed)) => warn!(missed, "dropped task reports"),
                Err(RecvError::Closed) => reports_open = false,
            },
            _ = observers.changed() => observers.print(&presenter),
            reason = shutdown.wait() => break reason,
        }
    };

    info!(signal = reason.as_str(), "daemon shutting down");
    observers.stop();
    if background {
        registry.unregister(BACKGROUND_RECORDING_TASK);
    }
    presenter.daemon_status("Stopped");

    ExitCode::from(EXIT_SUCCESS)
}

fn present_report(presenter: &Presenter, report: &TaskReport) {
    match &report.outcome {
        CycleOutcome::NewData(path) => presenter.success(&format!(
            "{}: saved {}",
            report.name,
            path.display()
        )),
        CycleOutcome::Failed(reason) => {
            presenter.warn(&format!("{}: {}", report.name, reason))
        }
    }
}
