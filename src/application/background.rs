//! Background recording task and periodic job registry

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::capture::{AudioMode, CapturePreset};
use crate::domain::permission::PermissionKind;
use crate::domain::recording::{Duration, RecordingKind};

use super::ports::{AudioCapture, Permissions, RecordingFiles};
use super::recorder::RecorderError;
use super::store::store_capture;

/// Name the background recorder is registered under
pub const BACKGROUND_RECORDING_TASK: &str = "background-recording";

/// Result of one background cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new recording was saved
    NewData(PathBuf),
    /// The cycle gave up; nothing was saved
    Failed(String),
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewData(path) => write!(f, "saved {}", path.display()),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// A unit of periodic work
#[async_trait]
pub trait BackgroundJob: Send + Sync {
    /// Run one cycle. Never fails; problems are reported in the outcome.
    async fn run(&self) -> CycleOutcome;
}

/// Settings for background capture
#[derive(Debug, Clone)]
pub struct BackgroundCaptureConfig {
    pub dir: PathBuf,
    pub capture_duration: Duration,
    pub preset: CapturePreset,
}

/// Records a fixed-length clip into the managed directory.
///
/// Uses its own capture handle, so it never touches an interactive session.
pub struct BackgroundRecordingTask<C, F, P>
where
    C: AudioCapture,
    F: RecordingFiles,
    P: Permissions,
{
    capture: Arc<C>,
    files: Arc<F>,
    permissions: Arc<P>,
    config: BackgroundCaptureConfig,
}

impl<C, F, P> BackgroundRecordingTask<C, F, P>
where
    C: AudioCapture,
    F: RecordingFiles,
    P: Permissions,
{
    pub fn new(capture: Arc<C>, files: Arc<F>, permissions: Arc<P>, config: BackgroundCaptureConfig) -> Self {
        Self {
            capture,
            files,
            permissions,
            config,
        }
    }

    /// Run one capture-and-save cycle
    pub async fn run_cycle(&self) -> CycleOutcome {
        match self.try_cycle().await {
            Ok(path) => {
                info!(path = %path.display(), "background recording saved");
                CycleOutcome::NewData(path)
            }
            Err(e) => {
                warn!(error = %e, "background recording failed");
                CycleOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_cycle(&self) -> Result<PathBuf, RecorderError> {
        // Background work never prompts
        if !self
            .permissions
            .status(PermissionKind::Microphone)
            .await
            .is_granted()
        {
            return Err(RecorderError::PermissionDenied);
        }

        self.files.ensure_dir(&self.config.dir).await?;
        self.capture
            .set_mode(AudioMode::background_recording())
            .await?;

        let mut handle = self.capture.open(self.config.preset).await?;
        debug!(duration = %self.config.capture_duration, "background capture started");
        time::sleep(self.config.capture_duration.as_std()).await;
        let temp = handle.finish().await?;
        drop(handle);

        Ok(store_capture(
            self.files.as_ref(),
            &self.config.dir,
            RecordingKind::Background,
            &temp,
        )
        .await?)
    }
}

#[async_trait]
impl<C, F, P> BackgroundJob for BackgroundRecordingTask<C, F, P>
where
    C: AudioCapture,
    F: RecordingFiles,
    P: Permissions,
{
    async fn run(&self) -> CycleOutcome {
        self.run_cycle().await
    }
}

/// Scheduling options for a registered job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskOptions {
    /// Time between the starts of two cycles
    pub minimum_interval: Duration,
    /// A cycle running longer than this is cancelled and counted as failed
    pub execution_budget: Duration,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            minimum_interval: Duration::default_background_interval(),
            execution_budget: Duration::from_secs(90),
        }
    }
}

/// Outcome of one cycle of a named job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub name: String,
    pub outcome: CycleOutcome,
}

/// Process-wide registry of periodic jobs.
///
/// Registration and unregistration are idempotent. Jobs run on the tokio
/// runtime that was current when they were registered.
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
    reports: broadcast::Sender<TaskReport>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        let (reports, _) = broadcast::channel(16);
        Self {
            tasks: Mutex::new(HashMap::new()),
            reports,
        }
    }

    /// The registry shared by the whole process
    pub fn global() -> &'static TaskRegistry {
        static REGISTRY: OnceLock<TaskRegistry> = OnceLock::new();
        REGISTRY.get_or_init(TaskRegistry::new)
    }

    /// Schedule `job` every `options.minimum_interval`, first run one
    /// interval from now.
    ///
    /// # Returns
    /// false if a job with this name is already registered
    pub fn register(&self, name: &str, options: TaskOptions, job: Arc<dyn BackgroundJob>) -> bool {
        let mut tasks = self.lock();
        if tasks.get(name).is_some_and(|task| !task.is_finished()) {
            debug!(task = name, "already registered");
            return false;
        }

        let task_name = name.to_string();
        let reports = self.reports.clone();
        let period = options.minimum_interval.as_std().max(std::time::Duration::from_millis(1));
        let budget = options.execution_budget.as_std();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let outcome = match time::timeout(budget, job.run()).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(task = %task_name, "cycle exceeded its execution budget");
                        CycleOutcome::Failed("execution budget exceeded".to_string())
                    }
                };
                debug!(task = %task_name, outcome = %outcome, "cycle complete");
                let _ = reports.send(TaskReport {
                    name: task_name.clone(),
                    outcome,
                });
            }
        });

        tasks.insert(name.to_string(), handle);
        info!(
            task = name,
            interval = %options.minimum_interval,
            budget = %options.execution_budget,
            "registered background task"
        );
        true
    }

    /// Cancel a job, including a cycle in progress.
    ///
    /// # Returns
    /// false if nothing was registered under `name`
    pub fn unregister(&self, name: &str) -> bool {
        match self.lock().remove(name) {
            Some(handle) => {
                handle.abort();
                info!(task = name, "unregistered background task");
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.lock()
            .get(name)
            .is_some_and(|task| !task.is_finished())
    }

    /// Receive a report after every cycle of every job
    pub fn subscribe(&self) -> broadcast::Receiver<TaskReport> {
        self.reports.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{FixedPermissions, MemoryFiles, MockCapture};
    use crate::domain::permission::PermissionStatus;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    const DIR: &str = "/data/audio";

    fn task_with(
        status: PermissionStatus,
    ) -> (
        BackgroundRecordingTask<MockCapture, MemoryFiles, FixedPermissions>,
        Arc<MemoryFiles>,
        Arc<MockCapture>,
    ) {
        let files = Arc::new(MemoryFiles::new());
        let capture = Arc::new(MockCapture::new(files.clone()));
        let task = BackgroundRecordingTask::new(
            capture.clone(),
            files.clone(),
            Arc::new(FixedPermissions(status)),
            BackgroundCaptureConfig {
                dir: PathBuf::from(DIR),
                capture_duration: Duration::from_millis(10),
                preset: CapturePreset::LowQuality,
            },
        );
        (task, files, capture)
    }

    struct CountingJob {
        runs: AtomicUsize,
        delay: StdDuration,
    }

    impl CountingJob {
        fn new(delay: StdDuration) -> Arc<Self> {
            Arc::new(Self {
                runs: AtomicUsize::new(0),
                delay,
            })
        }
    }

    #[async_trait]
    impl BackgroundJob for CountingJob {
        async fn run(&self) -> CycleOutcome {
            self.runs.fetch_add(1, Ordering::SeqCst);
            time::sleep(self.delay).await;
            CycleOutcome::NewData(PathBuf::from("/data/audio/x.wav"))
        }
    }

    fn fast() -> TaskOptions {
        TaskOptions {
            minimum_interval: Duration::from_millis(10),
            execution_budget: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn cycle_saves_background_recording() {
        let (task, files, capture) = task_with(PermissionStatus::Granted);

        let outcome = task.run_cycle().await;
        let CycleOutcome::NewData(path) = outcome else {
            panic!("expected new data, got {outcome:?}");
        };
        assert_eq!(path.parent(), Some(Path::new(DIR)));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("background-recording-"));
        assert!(files.contains(&path));
        assert_eq!(
            capture.modes.lock().unwrap().as_slice(),
            [AudioMode::background_recording()]
        );
    }

    #[tokio::test]
    async fn cycle_without_permission_fails() {
        let (task, files, capture) = task_with(PermissionStatus::Undetermined);

        assert!(matches!(task.run_cycle().await, CycleOutcome::Failed(_)));
        assert_eq!(capture.opened.load(Ordering::SeqCst), 0);
        assert!(files.paths().is_empty());
    }

    #[tokio::test]
    async fn capture_failure_is_reported_not_propagated() {
        let (task, files, capture) = task_with(PermissionStatus::Granted);
        capture.fail.lock().unwrap().finish = true;

        let outcome = task.run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::Failed(ref reason) if reason.contains("finalize")));
        assert!(files.paths().is_empty());
    }

    #[tokio::test]
    async fn register_is_idempotent() {
        let registry = TaskRegistry::new();
        let job = CountingJob::new(StdDuration::ZERO);

        assert!(registry.register("job", fast(), job.clone()));
        assert!(!registry.register("job", fast(), job.clone()));
        assert!(registry.is_registered("job"));

        assert!(registry.unregister("job"));
        assert!(!registry.unregister("job"));
        assert!(!registry.is_registered("job"));
    }

    #[tokio::test]
    async fn registered_job_runs_periodically() {
        let registry = TaskRegistry::new();
        let mut reports = registry.subscribe();
        let job = CountingJob::new(StdDuration::ZERO);
        registry.register("job", fast(), job.clone());

        for _ in 0..2 {
            let report = time::timeout(StdDuration::from_secs(2), reports.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(report.name, "job");
            assert!(matches!(report.outcome, CycleOutcome::NewData(_)));
        }
        assert!(job.runs.load(Ordering::SeqCst) >= 2);
        registry.unregister("job");
    }

    #[tokio::test]
    async fn first_run_waits_one_interval() {
        let registry = TaskRegistry::new();
        let job = CountingJob::new(StdDuration::ZERO);
        let options = TaskOptions {
            minimum_interval: Duration::from_secs(60),
            ..TaskOptions::default()
        };
        registry.register("job", options, job.clone());

        time::sleep(StdDuration::from_millis(30)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 0);
        registry.unregister("job");
    }

    #[tokio::test]
    async fn overrunning_cycle_counts_as_failed() {
        let registry = TaskRegistry::new();
        let mut reports = registry.subscribe();
        registry.register("slow", fast(), CountingJob::new(StdDuration::from_secs(5)));

        let report = time::timeout(StdDuration::from_secs(2), reports.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            report.outcome,
            CycleOutcome::Failed("execution budget exceeded".to_string())
        );
        registry.unregister("slow");
    }

    #[tokio::test]
    async fn unregister_stops_future_runs() {
        let registry = TaskRegistry::new();
        let job = CountingJob::new(StdDuration::ZERO);
        registry.register("job", fast(), job.clone());
        registry.unregister("job");

        time::sleep(StdDuration::from_millis(40)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn global_registry_is_shared() {
        assert!(std::ptr::eq(TaskRegistry::global(), TaskRegistry::global()));
    }

    #[test]
    fn default_options() {
        let options = TaskOptions::default();
        assert_eq!(options.minimum_interval.as_secs(), 60);
        assert_eq!(options.execution_budget.as_secs(), 90);
    }
}
