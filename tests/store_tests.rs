//! Recording and store scenarios against the real file system

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tempfile::TempDir;

use pocket_recorder::application::ports::{AudioCapture, CaptureError, CaptureHandle};
use pocket_recorder::application::{
    BackgroundCaptureConfig, BackgroundRecordingTask, CycleOutcome, RecorderConfig,
    RecordingService, RecordingsStore,
};
use pocket_recorder::domain::config::LocationGrant;
use pocket_recorder::domain::{
    AudioMode, CapturePreset, Duration, PermissionStatus, RecordingKind, SessionState,
};
use pocket_recorder::infrastructure::{ConfigPermissions, LocalFiles};

/// Capture that writes a small fake clip into a scratch directory
struct FileCapture {
    scratch: PathBuf,
    opened: AtomicU32,
}

impl FileCapture {
    fn new(scratch: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            scratch,
            opened: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl AudioCapture for FileCapture {
    async fn set_mode(&self, _mode: AudioMode) -> Result<(), CaptureError> {
        Ok(())
    }

    async fn open(&self, _preset: CapturePreset) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        let id = self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FileCaptureHandle {
            path: self.scratch.join(format!("capture-{}.wav", id)),
        }))
    }
}

struct FileCaptureHandle {
    path: PathBuf,
}

#[async_trait]
impl CaptureHandle for FileCaptureHandle {
    async fn pause(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    async fn finish(&mut self) -> Result<PathBuf, CaptureError> {
        tokio::fs::write(&self.path, vec![1u8; 4096])
            .await
            .map_err(|e| CaptureError::FinalizeFailed(e.to_string()))?;
        Ok(self.path.clone())
    }
}

struct Fixture {
    _root: TempDir,
    dir: PathBuf,
    scratch: PathBuf,
    files: Arc<LocalFiles>,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("audio");
        let scratch = root.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();
        Self {
            dir,
            scratch,
            files: Arc::new(LocalFiles::new()),
            _root: root,
        }
    }

    fn service(&self) -> RecordingService<FileCapture, LocalFiles, ConfigPermissions> {
        let mut config = RecorderConfig::new(&self.dir);
        config.tick = Duration::from_millis(50);
        RecordingService::new(
            FileCapture::new(self.scratch.clone()),
            Arc::clone(&self.files),
            Arc::new(ConfigPermissions::new(
                PermissionStatus::Granted,
                LocationGrant::Foreground,
            )),
            config,
        )
    }

    fn store(&self) -> RecordingsStore<LocalFiles> {
        RecordingsStore::new(Arc::clone(&self.files), &self.dir)
    }
}

#[tokio::test]
async fn record_then_list() {
    let fixture = Fixture::new();
    let mut store = fixture.store();

    assert!(store.load().await.unwrap().is_empty());
    assert!(fixture.dir.is_dir());

    let mut service = fixture.service();
    service.start().await.unwrap();
    tokio::time::sleep(StdDuration::from_millis(120)).await;
    assert!(service.elapsed().as_millis() >= 100);
    let saved = service.stop().await.unwrap().unwrap();
    assert_eq!(service.state(), SessionState::Idle);
    assert!(saved.starts_with(&fixture.dir));

    let entries = store.load().await.unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.kind(), Some(RecordingKind::Interactive));
    assert!(entry.filename().starts_with("recording-"));
    assert_eq!(entry.size(), Some(4096));
    // Default title is the local timestamp
    assert_eq!(entry.title().len(), "2024-01-01 00:00:00".len());
    assert!(std::fs::read_dir(&fixture.scratch).unwrap().next().is_none());
}

#[tokio::test]
async fn pause_and_resume_save_one_file() {
    let fixture = Fixture::new();
    let mut service = fixture.service();

    service.start().await.unwrap();
    service.pause().await.unwrap();
    service.resume().await.unwrap();
    service.stop().await.unwrap();

    assert_eq!(fixture.store().load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn cancelled_session_leaves_nothing() {
    let fixture = Fixture::new();
    let mut service = fixture.service();

    service.start().await.unwrap();
    service.cancel().await;

    assert!(fixture.store().load().await.unwrap().is_empty());
}

#[tokio::test]
async fn rename_survives_reload() {
    let fixture = Fixture::new();
    let mut service = fixture.service();
    service.start().await.unwrap();
    let saved = service.stop().await.unwrap().unwrap();
    let filename = saved.file_name().unwrap().to_string_lossy().into_owned();

    let mut store = fixture.store();
    store.load().await.unwrap();
    store.rename(&filename, "  Standup notes ").await.unwrap();

    let mut reloaded = fixture.store();
    let entries = reloaded.load().await.unwrap();
    assert_eq!(entries[0].title(), "Standup notes");
    assert_eq!(entries[0].path(), saved.as_path());
}

#[tokio::test]
async fn delete_removes_from_disk_and_list() {
    let fixture = Fixture::new();
    let mut service = fixture.service();
    service.start().await.unwrap();
    let first = service.stop().await.unwrap().unwrap();
    service.start().await.unwrap();
    let second = service.stop().await.unwrap().unwrap();
    assert_ne!(first, second);

    let mut store = fixture.store();
    assert_eq!(store.load().await.unwrap().len(), 2);

    let filename = first.file_name().unwrap().to_string_lossy().into_owned();
    store.remove(&filename).await.unwrap();
    assert!(!first.exists());

    let entries = fixture.store().load().await.unwrap().to_vec();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path(), second.as_path());
}

#[tokio::test]
async fn file_deleted_behind_our_back_is_reconciled() {
    let fixture = Fixture::new();
    let mut service = fixture.service();
    service.start().await.unwrap();
    let saved = service.stop().await.unwrap().unwrap();

    let mut store = fixture.store();
    store.load().await.unwrap();
    std::fs::remove_file(&saved).unwrap();

    let filename = saved.file_name().unwrap().to_string_lossy().into_owned();
    store.remove(&filename).await.unwrap();
    assert!(store.entries().is_empty());
}

#[tokio::test]
async fn background_cycle_saves_background_recording() {
    let fixture = Fixture::new();
    let task = BackgroundRecordingTask::new(
        FileCapture::new(fixture.scratch.clone()),
        Arc::clone(&fixture.files),
        Arc::new(ConfigPermissions::new(
            PermissionStatus::Granted,
            LocationGrant::Denied,
        )),
        BackgroundCaptureConfig {
            dir: fixture.dir.clone(),
            capture_duration: Duration::from_millis(10),
            preset: CapturePreset::LowQuality,
        },
    );

    let outcome = task.run_cycle().await;
    let CycleOutcome::NewData(path) = outcome else {
        panic!("expected new data, got {:?}", outcome);
    };
    assert!(path.exists());

    let entries = fixture.store().load().await.unwrap().to_vec();
    assert_eq!(entries[0].kind(), Some(RecordingKind::Background));
}

#[tokio::test]
async fn background_cycle_without_microphone_fails() {
    let fixture = Fixture::new();
    let task = BackgroundRecordingTask::new(
        FileCapture::new(fixture.scratch.clone()),
        Arc::clone(&fixture.files),
        Arc::new(ConfigPermissions::new(
            PermissionStatus::Denied,
            LocationGrant::Foreground,
        )),
        BackgroundCaptureConfig {
            dir: fixture.dir.clone(),
            capture_duration: Duration::from_millis(10),
            preset: CapturePreset::HighQuality,
        },
    );

    assert!(matches!(task.run_cycle().await, CycleOutcome::Failed(_)));
    assert!(fixture.store().load().await.unwrap().is_empty());
}
