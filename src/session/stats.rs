use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Snapshot of what a recording session currently holds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether a capture resource is held
    pub is_recording: bool,

    /// File the active capture writes to
    pub recording_path: Option<PathBuf>,

    /// When the active capture started
    pub recording_started_at: Option<DateTime<Utc>>,

    /// Seconds since the active capture started
    pub recording_elapsed_secs: f64,

    /// Whether a playback resource is held
    pub playback_active: bool,

    /// File bound to the active playback
    pub playback_path: Option<PathBuf>,

    /// Whether the active playback has reached the end
    pub playback_finished: bool,
}
