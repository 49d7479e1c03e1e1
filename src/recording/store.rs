use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name prefix shared by every recording
pub const FILE_PREFIX: &str = "audio_record_";

/// A finished recording on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recording {
    pub path: PathBuf,
    /// Parsed from the millisecond timestamp in the file name
    pub created_at: Option<DateTime<Utc>>,
}

impl Recording {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let created_at = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix(FILE_PREFIX))
            .and_then(|millis| millis.parse::<i64>().ok())
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single());

        Self { path, created_at }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The directory recordings are written to and listed from
#[derive(Debug, Clone)]
pub struct RecordingStore {
    dir: PathBuf,
    extension: String,
}

impl RecordingStore {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build `audio_record_<unix-millis>.<ext>` for `now`, creating the directory if needed
    ///
    /// Starts from `now` and moves forward one millisecond at a time until the
    /// name is free, so two recordings never share a file. The path is
    /// absolute and canonical, the same form `list` reports.
    pub fn next_output_path(&self, now: DateTime<Utc>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create recordings directory: {}", self.dir.display())
        })?;
        let dir = fs::canonicalize(&self.dir).with_context(|| {
            format!("Failed to resolve recordings directory: {}", self.dir.display())
        })?;

        let mut millis = now.timestamp_millis();
        loop {
            let path = dir.join(format!("{}{}.{}", FILE_PREFIX, millis, self.extension));
            if !path.exists() {
                debug!("Next recording path: {}", path.display());
                return Ok(path);
            }
            millis += 1;
        }
    }

    /// Every regular file in the directory carrying the recording extension
    ///
    /// Ordered oldest first by the timestamp in the name, then by name. A
    /// missing directory simply holds no recordings.
    pub fn list(&self) -> Result<Vec<Recording>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Recordings directory missing: {}", self.dir.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read recordings directory: {}", self.dir.display())
                })
            }
        };

        let suffix = format!(".{}", self.extension);
        let mut recordings = Vec::new();

        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.ends_with(&suffix) {
                continue;
            }
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let path = fs::canonicalize(entry.path()).unwrap_or_else(|_| entry.path());
            recordings.push(Recording::from_path(path));
        }

        recordings.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.path.cmp(&b.path))
        });

        info!(
            "Found {} recordings in {}",
            recordings.len(),
            self.dir.display()
        );

        Ok(recordings)
    }

    /// Remove a file left behind by an aborted recording
    pub fn discard(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => debug!("Discarded partial recording {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to discard {}: {}", path.display(), e),
        }
    }
}
