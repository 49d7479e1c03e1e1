//! Recorder error types
//!
//! Host adapters report failures as `anyhow::Error` with context attached;
//! the session controller folds them into `RecorderError` so callers can
//! tell expected state conflicts apart from capture/playback failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::permissions::Permission;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Permission denied: {0}")]
    PermissionDenied(Permission),

    #[error("Already recording to {}", .0.display())]
    AlreadyRecording(PathBuf),

    #[error("Not recording")]
    NotRecording,

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Playback error for {}: {}", .path.display(), .message)]
    Playback { path: PathBuf, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl RecorderError {
    /// Expected state conflicts are reported to the user as a notice, not a failure
    pub fn is_state_conflict(&self) -> bool {
        matches!(self, Self::AlreadyRecording(_) | Self::NotRecording)
    }

    pub(crate) fn capture(err: anyhow::Error) -> Self {
        Self::Capture(format!("{:#}", err))
    }

    pub(crate) fn playback(path: impl Into<PathBuf>, err: anyhow::Error) -> Self {
        Self::Playback {
            path: path.into(),
            message: format!("{:#}", err),
        }
    }

    pub(crate) fn storage(err: anyhow::Error) -> Self {
        Self::Storage(format!("{:#}", err))
    }
}

pub type RecorderResult<T> = Result<T, RecorderError>;
