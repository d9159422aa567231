//! Local file system adapter for the recordings directory

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::application::ports::{RecordingFiles, StorageError};

/// Recordings kept on the local disk
pub struct LocalFiles;

impl LocalFiles {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFiles {
    fn default() -> Self {
        Self::new()
    }
}

fn storage_error(path: &Path, e: io::Error) -> StorageError {
    match e.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
        _ => StorageError::Io(format!("{}: {}", path.display(), e)),
    }
}

/// Hidden sibling that receives a copy before it is renamed into place
fn partial_path(to: &Path) -> PathBuf {
    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    to.with_file_name(format!(".{}.part", name))
}

/// Copy `from` next to `to`, then rename it into place.
///
/// `to` only ever appears complete. On failure the partial copy is removed
/// and `from` is left untouched.
async fn copy_across(from: &Path, to: &Path) -> Result<(), StorageError> {
    let partial = partial_path(to);
    let result = match fs::copy(from, &partial).await {
        Ok(_) => fs::rename(&partial, to)
            .await
            .map_err(|e| storage_error(to, e)),
        Err(e) => Err(storage_error(to, e)),
    };
    if result.is_err() {
        if let Err(e) = fs::remove_file(&partial).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %partial.display(), error = %e, "could not remove partial copy");
            }
        }
    }
    result
}

#[async_trait]
impl RecordingFiles for LocalFiles {
    async fn ensure_dir(&self, dir: &Path) -> Result<bool, StorageError> {
        if fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Ok(false);
        }
        fs::create_dir_all(dir)
            .await
            .map_err(|e| storage_error(dir, e))?;
        Ok(true)
    }

    async fn list(&self, dir: &Path) -> Result<Vec<String>, StorageError> {
        let mut entries = fs::read_dir(dir).await.map_err(|e| storage_error(dir, e))?;
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_error(dir, e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    async fn size(&self, path: &Path) -> Result<u64, StorageError> {
        fs::metadata(path)
            .await
            .map(|m| m.len())
            .map_err(|e| storage_error(path, e))
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        match fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(storage_error(from, e)),
            Err(e) => {
                // Temp dir and recordings dir may sit on different volumes
                debug!(error = %e, "rename failed, copying instead");
                copy_across(from, to).await?;
                fs::remove_file(from)
                    .await
                    .map_err(|e| storage_error(from, e))
            }
        }
    }

    async fn delete(&self, path: &Path) -> Result<(), StorageError> {
        fs::remove_file(path)
            .await
            .map_err(|e| storage_error(path, e))
    }

    async fn read_text(&self, path: &Path) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(path, e)),
        }
    }

    async fn write_text(&self, path: &Path, contents: &str) -> Result<(), StorageError> {
        // Write to a sibling temp file then rename, so readers never see half a file
        let temp = path.with_extension("tmp");
        fs::write(&temp, contents)
            .await
            .map_err(|e| storage_error(&temp, e))?;
        fs::rename(&temp, path)
            .await
            .map_err(|e| storage_error(path, e))
    }

    #[cfg(unix)]
    async fn free_space(&self, path: &Path) -> Result<u64, StorageError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            nix::sys::statvfs::statvfs(&path)
                .map(|stat| stat.blocks_available() as u64 * stat.fragment_size() as u64)
                .map_err(|e| StorageError::Io(format!("{}: {}", path.display(), e)))
        })
        .await
        .map_err(|e| StorageError::Io(format!("Task join error: {}", e)))?
    }

    #[cfg(not(unix))]
    async fn free_space(&self, _path: &Path) -> Result<u64, StorageError> {
        Err(StorageError::Unsupported("free space query".to_string()))
    }
}
