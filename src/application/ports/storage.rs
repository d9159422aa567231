//! File storage port interface

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Storage operation failed: {0}")]
    Io(String),

    #[error("Not supported on this platform: {0}")]
    Unsupported(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Port for the files backing the recordings list
#[async_trait]
pub trait RecordingFiles: Send + Sync {
    /// Create `dir` (and parents) if missing.
    ///
    /// # Returns
    /// true if the directory was created by this call
    async fn ensure_dir(&self, dir: &Path) -> Result<bool, StorageError>;

    /// Names of the regular files directly inside `dir`
    async fn list(&self, dir: &Path) -> Result<Vec<String>, StorageError>;

    /// Byte length of a file
    async fn size(&self, path: &Path) -> Result<u64, StorageError>;

    /// Whether anything exists at `path`
    async fn exists(&self, path: &Path) -> bool;

    /// Move a file, across volumes if needed
    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), StorageError>;

    /// Delete a file
    async fn delete(&self, path: &Path) -> Result<(), StorageError>;

    /// Read a small text file, None if it does not exist
    async fn read_text(&self, path: &Path) -> Result<Option<String>, StorageError>;

    /// Replace the contents of a small text file
    async fn write_text(&self, path: &Path, contents: &str) -> Result<(), StorageError>;

    /// Free bytes available on the volume holding `path`
    async fn free_space(&self, path: &Path) -> Result<u64, StorageError>;
}
