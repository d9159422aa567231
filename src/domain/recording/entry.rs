//! Recording entries and the timestamp naming convention

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};

use crate::domain::error::InvalidTitleError;

/// File extensions listed as recordings
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "m4a", "ogg", "flac", "mp3"];

/// Format used for default titles
const TITLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which flow produced a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordingKind {
    Interactive,
    Background,
}

impl RecordingKind {
    /// Filename prefix for this kind
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Interactive => "recording",
            Self::Background => "background-recording",
        }
    }
}

/// A storage name of the form `<prefix>-<unixMillis>.<ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingName {
    kind: RecordingKind,
    timestamp_ms: i64,
    extension: String,
}

impl RecordingName {
    pub fn new(kind: RecordingKind, timestamp_ms: i64, extension: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp_ms,
            extension: extension.into(),
        }
    }

    /// Name stamped with the current wall-clock time
    pub fn now(kind: RecordingKind, extension: impl Into<String>) -> Self {
        Self::new(kind, Local::now().timestamp_millis(), extension)
    }

    /// Parse a filename produced by [`RecordingName::filename`].
    /// Returns None for anything that does not carry a timestamp.
    pub fn parse(filename: &str) -> Option<Self> {
        let (stem, extension) = filename.rsplit_once('.')?;
        let (kind, rest) = [RecordingKind::Background, RecordingKind::Interactive]
            .into_iter()
            .find_map(|kind| {
                stem.strip_prefix(kind.prefix())
                    .and_then(|rest| rest.strip_prefix('-'))
                    .map(|rest| (kind, rest))
            })?;
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let timestamp_ms = rest.parse().ok()?;
        Some(Self::new(kind, timestamp_ms, extension))
    }

    pub fn kind(&self) -> RecordingKind {
        self.kind
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Same name one millisecond later, used to step around a collision
    pub fn next(&self) -> Self {
        Self::new(self.kind, self.timestamp_ms + 1, self.extension.clone())
    }

    pub fn filename(&self) -> String {
        format!(
            "{}-{}.{}",
            self.kind.prefix(),
            self.timestamp_ms,
            self.extension
        )
    }

    /// Local-time rendering of the embedded timestamp
    pub fn default_title(&self) -> Option<String> {
        Local
            .timestamp_millis_opt(self.timestamp_ms)
            .single()
            .map(|dt| dt.format(TITLE_FORMAT).to_string())
    }
}

impl fmt::Display for RecordingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filename())
    }
}

/// A validated, non-empty display title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    /// Trim and validate a user-provided title
    pub fn new(raw: &str) -> Result<Self, InvalidTitleError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvalidTitleError);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Whether a filename looks like an audio recording
pub fn is_audio_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// One stored recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingEntry {
    path: PathBuf,
    filename: String,
    title: String,
    size: Option<u64>,
    name: Option<RecordingName>,
}

impl RecordingEntry {
    /// Build an entry for `filename` inside `dir` with its default title
    pub fn new(dir: &Path, filename: impl Into<String>, size: Option<u64>) -> Self {
        let filename = filename.into();
        let name = RecordingName::parse(&filename);
        let title = name
            .as_ref()
            .and_then(RecordingName::default_title)
            .unwrap_or_else(|| filename.clone());
        Self {
            path: dir.join(&filename),
            filename,
            title,
            size,
            name,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn kind(&self) -> Option<RecordingKind> {
        self.name.as_ref().map(RecordingName::kind)
    }

    pub fn timestamp_ms(&self) -> Option<i64> {
        self.name.as_ref().map(RecordingName::timestamp_ms)
    }

    /// Replace the title. Path and filename are untouched.
    pub fn set_title(&mut self, title: Title) -> String {
        std::mem::replace(&mut self.title, title.into_inner())
    }

    /// Restore a previous title verbatim
    pub(crate) fn restore_title(&mut self, title: String) {
        self.title = title;
    }

    /// Ordering used for listings: newest first, unstamped files last by name
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        match (a.timestamp_ms(), b.timestamp_ms()) {
            (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.filename.cmp(&b.filename)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.filename.cmp(&b.filename),
        }
    }
}
