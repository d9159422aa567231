//! Recordings store use case

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::recording::{is_audio_file, RecordingEntry, RecordingKind, RecordingName, Title};

use super::ports::{RecordingFiles, StorageError};

/// Sidecar file holding user-assigned titles
pub const TITLES_FILE: &str = "titles.json";

/// Errors from the recordings store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Recording title must not be empty")]
    EmptyTitle,

    #[error("No recording named '{0}'")]
    UnknownRecording(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Filename to title, persisted as a JSON object
#[derive(Debug, Default)]
struct TitleIndex {
    titles: BTreeMap<String, String>,
}

impl TitleIndex {
    fn parse(contents: &str) -> Self {
        match serde_json::from_str(contents) {
            Ok(titles) => Self { titles },
            Err(e) => {
                warn!(error = %e, "discarding malformed title index");
                Self::default()
            }
        }
    }

    fn get(&self, filename: &str) -> Option<&str> {
        self.titles.get(filename).map(String::as_str)
    }

    fn set(&mut self, filename: &str, title: &str) -> Option<String> {
        self.titles.insert(filename.to_string(), title.to_string())
    }

    fn remove(&mut self, filename: &str) -> Option<String> {
        self.titles.remove(filename)
    }

    /// Drop titles for files that no longer exist
    fn retain_known(&mut self, entries: &[RecordingEntry]) {
        self.titles
            .retain(|filename, _| entries.iter().any(|e| e.filename() == filename));
    }

    fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string_pretty(&self.titles).map_err(|e| StorageError::Io(e.to_string()))
    }
}

/// The list of recordings in the managed directory.
///
/// Entries are kept newest-first. Titles survive reloads through the
/// sidecar index; audio files are never renamed.
pub struct RecordingsStore<F: RecordingFiles> {
    files: Arc<F>,
    dir: PathBuf,
    entries: Vec<RecordingEntry>,
    titles: TitleIndex,
    /// Set when the sidecar exists but could not be read. Writing over it
    /// would erase every title it holds.
    titles_unreadable: Option<StorageError>,
}

impl<F: RecordingFiles> RecordingsStore<F> {
    pub fn new(files: Arc<F>, dir: impl Into<PathBuf>) -> Self {
        Self {
            files,
            dir: dir.into(),
            entries: Vec::new(),
            titles: TitleIndex::default(),
            titles_unreadable: None,
        }
    }

    /// The managed directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Entries as of the last load, newest first
    pub fn entries(&self) -> &[RecordingEntry] {
        &self.entries
    }

    pub fn get(&self, filename: &str) -> Option<&RecordingEntry> {
        self.entries.iter().find(|e| e.filename() == filename)
    }

    /// Re-scan the managed directory, creating it if needed
    pub async fn load(&mut self) -> Result<&[RecordingEntry], StoreError> {
        if self.files.ensure_dir(&self.dir).await? {
            info!(dir = %self.dir.display(), "created recordings directory");
        }

        self.titles_unreadable = None;
        self.titles = match self.files.read_text(&self.dir.join(TITLES_FILE)).await {
            Ok(Some(contents)) => TitleIndex::parse(&contents),
            Ok(None) => TitleIndex::default(),
            Err(e) => {
                warn!(error = %e, "could not read title index, showing default titles");
                self.titles_unreadable = Some(e);
                TitleIndex::default()
            }
        };

        let mut entries = Vec::new();
        for filename in self.files.list(&self.dir).await? {
            if !is_audio_file(&filename) {
                continue;
            }
            let path = self.dir.join(&filename);
            let size = match self.files.size(&path).await {
                Ok(size) => Some(size),
                Err(e) => {
                    debug!(file = %filename, error = %e, "stat failed");
                    None
                }
            };
            let mut entry = RecordingEntry::new(&self.dir, filename, size);
            if let Some(title) = self.titles.get(entry.filename()) {
                entry.restore_title(title.to_string());
            }
            entries.push(entry);
        }
        entries.sort_by(RecordingEntry::newest_first);

        debug!(count = entries.len(), "loaded recordings");
        self.entries = entries;
        Ok(&self.entries)
    }

    /// Change the display title of a recording.
    /// The new title is persisted before the call returns.
    ///
    /// Fails without writing when the title index could not be read on the
    /// last load.
    pub async fn rename(&mut self, filename: &str, new_title: &str) -> Result<(), StoreError> {
        let title = Title::new(new_title).map_err(|_| StoreError::EmptyTitle)?;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.filename() == filename)
            .ok_or_else(|| StoreError::UnknownRecording(filename.to_string()))?;
        if let Some(e) = &self.titles_unreadable {
            warn!(file = %filename, error = %e, "title index unreadable, not renaming");
            return Err(e.clone().into());
        }

        let previous_index = self.titles.set(filename, title.as_str());
        let previous_title = entry.set_title(title);

        if let Err(e) = persist_titles(self.files.as_ref(), &self.dir, &self.titles).await {
            warn!(file = %filename, error = %e, "title not saved, reverting");
            entry.restore_title(previous_title);
            match previous_index {
                Some(old) => {
                    self.titles.set(filename, &old);
                }
                None => {
                    self.titles.remove(filename);
                }
            }
            return Err(e.into());
        }

        info!(file = %filename, title = %entry.title(), "renamed recording");
        Ok(())
    }

    /// Delete a recording and its file.
    ///
    /// A file that is already gone counts as deleted. Any other failure
    /// leaves the entry in place.
    pub async fn remove(&mut self, filename: &str) -> Result<(), StoreError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.filename() == filename)
            .ok_or_else(|| StoreError::UnknownRecording(filename.to_string()))?;

        match self.files.delete(self.entries[index].path()).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                info!(file = %filename, "file already gone, dropping entry");
            }
            Err(e) => {
                warn!(file = %filename, error = %e, "delete failed");
                return Err(e.into());
            }
        }

        self.entries.remove(index);
        if self.titles_unreadable.is_none() && self.titles.remove(filename).is_some() {
            self.titles.retain_known(&self.entries);
            if let Err(e) = persist_titles(self.files.as_ref(), &self.dir, &self.titles).await {
                warn!(error = %e, "could not update title index");
            }
        }

        info!(file = %filename, "deleted recording");
        Ok(())
    }
}

async fn persist_titles<F: RecordingFiles + ?Sized>(
    files: &F,
    dir: &Path,
    titles: &TitleIndex,
) -> Result<(), StorageError> {
    files.write_text(&dir.join(TITLES_FILE), &titles.to_json()?).await
}

/// First free `<prefix>-<millis>.<ext>` path in `dir`, stepping the
/// timestamp forward one millisecond per collision
pub async fn unique_destination<F: RecordingFiles + ?Sized>(
    files: &F,
    dir: &Path,
    kind: RecordingKind,
    extension: &str,
) -> PathBuf {
    let mut name = RecordingName::now(kind, extension);
    while files.exists(&dir.join(name.filename())).await {
        name = name.next();
    }
    dir.join(name.filename())
}

/// Move a finalized capture into `dir` under a fresh name.
/// On failure the temporary file is deleted best-effort.
pub async fn store_capture<F: RecordingFiles + ?Sized>(
    files: &F,
    dir: &Path,
    kind: RecordingKind,
    temp: &Path,
) -> Result<PathBuf, StorageError> {
    let extension = temp
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or(crate::domain::capture::CAPTURE_EXTENSION)
        .to_string();

    let result: Result<PathBuf, StorageError> = async {
        files.ensure_dir(dir).await?;
        let destination = unique_destination(files, dir, kind, &extension).await;
        files.move_file(temp, &destination).await?;
        Ok(destination)
    }
    .await;

    if result.is_err() {
        discard_temp(files, temp).await;
    }
    result
}

/// Best-effort removal of an abandoned temporary file
pub async fn discard_temp<F: RecordingFiles + ?Sized>(files: &F, temp: &Path) {
    if let Err(e) = files.delete(temp).await {
        if !e.is_not_found() {
            warn!(path = %temp.display(), error = %e, "could not remove temporary file");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::application::testing::MemoryFiles;
    use super::*;

    const DIR: &str = "/data/audio";

    fn store(files: &Arc<MemoryFiles>) -> RecordingsStore<MemoryFiles> {
        RecordingsStore::new(files.clone(), DIR)
    }

    fn path(name: &str) -> PathBuf {
        Path::new(DIR).join(name)
    }

    #[tokio::test]
    async fn load_creates_directory_and_returns_empty() {
        let files = Arc::new(MemoryFiles::new());
        let mut store = store(&files);

        assert!(store.load().await.unwrap().is_empty());
        assert!(files.dirs.lock().unwrap().contains(Path::new(DIR)));

        // Second load is not an error
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_orders_newest_first_and_skips_non_audio() {
        let files = Arc::new(MemoryFiles::new());
        files.put(path("recording-1000.wav"), "a");
        files.put(path("background-recording-3000.wav"), "bb");
        files.put(path("recording-2000.m4a"), "ccc");
        files.put(path("notes.txt"), "x");
        files.put(path("imported.mp3"), "dddd");
        let mut store = store(&files);

        let names: Vec<_> = store
            .load()
            .await
            .unwrap()
            .iter()
            .map(|e| e.filename().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "background-recording-3000.wav",
                "recording-2000.m4a",
                "recording-1000.wav",
                "imported.mp3",
            ]
        );
    }

    #[tokio::test]
    async fn load_uses_raw_filename_when_unstamped() {
        let files = Arc::new(MemoryFiles::new());
        files.put(path("imported.mp3"), "abc");
        let mut store = store(&files);
        store.load().await.unwrap();

        let entry = store.get("imported.mp3").unwrap();
        assert_eq!(entry.title(), "imported.mp3");
        assert_eq!(entry.size(), Some(3));
    }

    #[tokio::test]
    async fn rename_changes_only_title_and_persists() {
        let files = Arc::new(MemoryFiles::new());
        files.put(path("recording-1000.wav"), "a");
        let mut store = store(&files);
        store.load().await.unwrap();

        store.rename("recording-1000.wav", "  Standup  ").await.unwrap();
        let entry = store.get("recording-1000.wav").unwrap();
        assert_eq!(entry.title(), "Standup");
        assert_eq!(entry.path(), path("recording-1000.wav"));

        // Survives a reload
        store.load().await.unwrap();
        assert_eq!(store.get("recording-1000.wav").unwrap().title(), "Standup");
        assert!(files.contains(&path("recording-1000.wav")));
    }

    #[tokio::test]
    async fn rename_rejects_blank_title() {
        let files = Arc::new(MemoryFiles::new());
        files.put(path("recording-1000.wav"), "a");
        let mut store = store(&files);
        store.load().await.unwrap();
        let before = store.get("recording-1000.wav").unwrap().title().to_string();

        let result = store.rename("recording-1000.wav", "   ").await;
        assert!(matches!(result, Err(StoreError::EmptyTitle)));
        assert_eq!(store.get("recording-1000.wav").unwrap().title(), before);
    }

    #[tokio::test]
    async fn rename_unknown_recording_fails() {
        let files = Arc::new(MemoryFiles::new());
        let mut store = store(&files);
        store.load().await.unwrap();

        let result = store.rename("recording-1.wav", "x").await;
        assert!(matches!(result, Err(StoreError::UnknownRecording(_))));
    }

    #[tokio::test]
    async fn rename_reverts_when_index_write_fails() {
        let files = Arc::new(MemoryFiles::new());
        files.put(path("recording-1000.wav"), "a");
        let mut store = store(&files);
        store.load().await.unwrap();
        let before = store.get("recording-1000.wav").unwrap().title().to_string();

        *files.fail_write.lock().unwrap() = true;
        let result = store.rename("recording-1000.wav", "Lecture").await;
        assert!(matches!(result, Err(StoreError::Storage(_))));
        assert_eq!(store.get("recording-1000.wav").unwrap().title(), before);
    }

    #[tokio::test]
    async fn unreadable_index_is_never_overwritten() {
        let files = Arc::new(MemoryFiles::new());
        files.put(path("recording-1000.wav"), "a");
        files.put(path("recording-2000.wav"), "b");
        let index = r#"{"recording-1000.wav":"Standup","recording-2000.wav":"Lecture"}"#;
        files.put(path(TITLES_FILE), index);
        let mut store = store(&files);

        *files.fail_read.lock().unwrap() = true;
        assert_eq!(store.load().await.unwrap().len(), 2);
        let before = store.get("recording-1000.wav").unwrap().title().to_string();

        let result = store.rename("recording-1000.wav", "Retro").await;
        assert!(matches!(result, Err(StoreError::Storage(_))));
        assert_eq!(store.get("recording-1000.wav").unwrap().title(), before);
        store.remove("recording-2000.wav").await.unwrap();
        assert_eq!(files.text(&path(TITLES_FILE)).as_deref(), Some(index));

        // Once readable again the saved titles come back
        *files.fail_read.lock().unwrap() = false;
        store.load().await.unwrap();
        assert_eq!(store.get("recording-1000.wav").unwrap().title(), "Standup");
        store.rename("recording-1000.wav", "Retro").await.unwrap();
    }

    #[tokio::test]
    async fn remove_deletes_file_and_entry() {
        let files = Arc::new(MemoryFiles::new());
        files.put(path("recording-1000.wav"), "a");
        files.put(path("recording-2000.wav"), "b");
        let mut store = store(&files);
        store.load().await.unwrap();
        store.rename("recording-1000.wav", "Old").await.unwrap();

        store.remove("recording-1000.wav").await.unwrap();
        assert!(store.get("recording-1000.wav").is_none());
        assert!(!files.contains(&path("recording-1000.wav")));

        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded.len(), 1);
        let index = files.text(&path(TITLES_FILE)).unwrap();
        assert!(!index.contains("recording-1000.wav"));
    }

    #[tokio::test]
    async fn remove_keeps_entry_when_delete_fails() {
        let files = Arc::new(MemoryFiles::new());
        files.put(path("recording-1000.wav"), "a");
        let mut store = store(&files);
        store.load().await.unwrap();

        *files.fail_delete.lock().unwrap() = true;
        let result = store.remove("recording-1000.wav").await;
        assert!(matches!(result, Err(StoreError::Storage(_))));
        assert!(store.get("recording-1000.wav").is_some());
    }

    #[tokio::test]
    async fn remove_reconciles_missing_file() {
        let files = Arc::new(MemoryFiles::new());
        files.put(path("recording-1000.wav"), "a");
        let mut store = store(&files);
        store.load().await.unwrap();

        files.files.lock().unwrap().clear();
        store.remove("recording-1000.wav").await.unwrap();
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn malformed_title_index_is_ignored() {
        let files = Arc::new(MemoryFiles::new());
        files.put(path("recording-1000.wav"), "a");
        files.put(path(TITLES_FILE), "{not json");
        let mut store = store(&files);

        let entries = store.load().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_ne!(entries[0].title(), "{not json");
    }

    #[tokio::test]
    async fn unique_destination_steps_past_collisions() {
        let files = MemoryFiles::new();
        let dir = Path::new(DIR);
        let first = unique_destination(&files, dir, RecordingKind::Interactive, "wav").await;
        files.put(first.clone(), "x");

        let second = unique_destination(&files, dir, RecordingKind::Interactive, "wav").await;
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn store_capture_discards_temp_on_failure() {
        let files = MemoryFiles::new();
        let temp = PathBuf::from("/tmp/capture.wav");
        files.put(temp.clone(), "pcm");
        *files.fail_move.lock().unwrap() = true;

        let result =
            store_capture(&files, Path::new(DIR), RecordingKind::Background, &temp).await;
        assert!(result.is_err());
        assert!(!files.contains(&temp));
    }

    #[tokio::test]
    async fn store_capture_names_by_kind() {
        let files = MemoryFiles::new();
        let temp = PathBuf::from("/tmp/capture.wav");
        files.put(temp.clone(), "pcm");

        let stored = store_capture(&files, Path::new(DIR), RecordingKind::Background, &temp)
            .await
            .unwrap();
        let name = stored.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("background-recording-"));
        assert!(name.ends_with(".wav"));
        assert!(files.contains(&stored));
    }
}
