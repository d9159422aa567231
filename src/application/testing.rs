//! Test doubles shared by the use case tests

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::ports::{
    AudioCapture, CaptureError, CaptureHandle, Permissions, RecordingFiles, StorageError,
};
use crate::domain::capture::{AudioMode, CapturePreset};
use crate::domain::permission::{PermissionKind, PermissionStatus};

/// In-memory stand-in for the local file system
#[derive(Default)]
pub struct MemoryFiles {
    pub files: Mutex<BTreeMap<PathBuf, String>>,
    pub dirs: Mutex<HashSet<PathBuf>>,
    pub fail_delete: Mutex<bool>,
    pub fail_write: Mutex<bool>,
    pub fail_read: Mutex<bool>,
    pub fail_move: Mutex<bool>,
    pub free: u64,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self {
            free: 5 * 1024 * 1024 * 1024,
            ..Self::default()
        }
    }

    pub fn put(&self, path: impl Into<PathBuf>, contents: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), contents.to_string());
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn text(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl RecordingFiles for MemoryFiles {
    async fn ensure_dir(&self, dir: &Path) -> Result<bool, StorageError> {
        Ok(self.dirs.lock().unwrap().insert(dir.to_path_buf()))
    }

    async fn list(&self, dir: &Path) -> Result<Vec<String>, StorageError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect())
    }

    async fn size(&self, path: &Path) -> Result<u64, StorageError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|c| c.len() as u64)
            .ok_or_else(|| StorageError::NotFound(path.display().to_string()))
    }

    async fn exists(&self, path: &Path) -> bool {
        self.contains(path)
    }

    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        if *self.fail_move.lock().unwrap() {
            return Err(StorageError::Io("disk full".to_string()));
        }
        let mut files = self.files.lock().unwrap();
        let contents = files
            .remove(from)
            .ok_or_else(|| StorageError::NotFound(from.display().to_string()))?;
        files.insert(to.to_path_buf(), contents);
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<(), StorageError> {
        if *self.fail_delete.lock().unwrap() {
            return Err(StorageError::Io("permission denied".to_string()));
        }
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.display().to_string()))
    }

    async fn read_text(&self, path: &Path) -> Result<Option<String>, StorageError> {
        if *self.fail_read.lock().unwrap() {
            return Err(StorageError::Io("permission denied".to_string()));
        }
        Ok(self.text(path))
    }

    async fn write_text(&self, path: &Path, contents: &str) -> Result<(), StorageError> {
        if *self.fail_write.lock().unwrap() {
            return Err(StorageError::Io("read-only".to_string()));
        }
        self.put(path, contents);
        Ok(())
    }

    async fn free_space(&self, _path: &Path) -> Result<u64, StorageError> {
        Ok(self.free)
    }
}

/// Which capture calls should fail
#[derive(Default)]
pub struct Failures {
    pub mode: bool,
    pub open: bool,
    pub pause: bool,
    pub finish: bool,
}

/// Capture port whose handles drop a small temp file into [`MemoryFiles`]
pub struct MockCapture {
    files: Arc<MemoryFiles>,
    pub fail: Mutex<Failures>,
    pub opened: AtomicU32,
    pub modes: Mutex<Vec<AudioMode>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockCapture {
    pub fn new(files: Arc<MemoryFiles>) -> Self {
        Self {
            files,
            fail: Mutex::new(Failures::default()),
            opened: AtomicU32::new(0),
            modes: Mutex::new(Vec::new()),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

struct MockHandle {
    id: u32,
    files: Arc<MemoryFiles>,
    fail_pause: bool,
    fail_finish: bool,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl AudioCapture for MockCapture {
    async fn set_mode(&self, mode: AudioMode) -> Result<(), CaptureError> {
        if self.fail.lock().unwrap().mode {
            return Err(CaptureError::ModeRejected("busy".to_string()));
        }
        self.modes.lock().unwrap().push(mode);
        Ok(())
    }

    async fn open(&self, _preset: CapturePreset) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        let fail = self.fail.lock().unwrap();
        if fail.open {
            return Err(CaptureError::OpenFailed("no device".to_string()));
        }
        let id = self.opened.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("open {id}"));
        Ok(Box::new(MockHandle {
            id,
            files: self.files.clone(),
            fail_pause: fail.pause,
            fail_finish: fail.finish,
            log: self.log.clone(),
        }))
    }
}

#[async_trait]
impl CaptureHandle for MockHandle {
    async fn pause(&mut self) -> Result<(), CaptureError> {
        if self.fail_pause {
            return Err(CaptureError::PauseFailed("device lost".to_string()));
        }
        self.log.lock().unwrap().push("pause".to_string());
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), CaptureError> {
        self.log.lock().unwrap().push("resume".to_string());
        Ok(())
    }

    async fn finish(&mut self) -> Result<PathBuf, CaptureError> {
        if self.fail_finish {
            return Err(CaptureError::FinalizeFailed("encoder".to_string()));
        }
        let temp = PathBuf::from(format!("/tmp/capture-{}.wav", self.id));
        self.files.put(temp.clone(), "RIFF....WAVE");
        self.log.lock().unwrap().push("finish".to_string());
        Ok(temp)
    }
}

/// Answers every permission query the same way
pub struct FixedPermissions(pub PermissionStatus);

#[async_trait]
impl Permissions for FixedPermissions {
    async fn status(&self, _kind: PermissionKind) -> PermissionStatus {
        self.0
    }

    async fn request(&self, _kind: PermissionKind) -> PermissionStatus {
        self.0
    }
}
