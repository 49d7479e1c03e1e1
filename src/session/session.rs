use super::config::SessionConfig;
use super::stats::SessionStats;
use crate::audio::{
    AudioBackendFactory, CaptureDevice, CaptureStream, EncodingProfile, PlaybackDevice,
    PlaybackStream,
};
use crate::error::{RecorderError, RecorderResult};
use crate::recording::{Recording, RecordingStore};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// The capture resource of an in-progress recording
struct ActiveCapture {
    stream: Box<dyn CaptureStream>,
    path: PathBuf,
    started_at: DateTime<Utc>,
}

/// The playback resource currently held
struct ActivePlayback {
    stream: Box<dyn PlaybackStream>,
    path: PathBuf,
}

/// Recording session controller
///
/// Owns at most one capture resource and at most one playback resource.
/// A recording is in progress exactly when a capture resource is held.
pub struct RecordingSession {
    store: RecordingStore,
    profile: EncodingProfile,
    capture: Box<dyn CaptureDevice>,
    playback: Box<dyn PlaybackDevice>,
    active_capture: Option<ActiveCapture>,
    active_playback: Option<ActivePlayback>,
}

impl RecordingSession {
    /// Create a session on the host's default microphone and speakers
    pub fn new(config: SessionConfig) -> Self {
        Self::with_devices(
            config,
            AudioBackendFactory::capture(),
            AudioBackendFactory::playback(),
        )
    }

    pub fn with_devices(
        config: SessionConfig,
        capture: Box<dyn CaptureDevice>,
        playback: Box<dyn PlaybackDevice>,
    ) -> Self {
        info!(
            "Recording session ready: {} ({}Hz, {} channels, .{}) via {} / {}",
            config.recordings_dir.display(),
            config.profile.sample_rate,
            config.profile.channels,
            config.profile.extension,
            capture.name(),
            playback.name()
        );

        Self {
            store: RecordingStore::new(config.recordings_dir, config.profile.extension),
            profile: config.profile,
            capture,
            playback,
            active_capture: None,
            active_playback: None,
        }
    }

    pub fn store(&self) -> &RecordingStore {
        &self.store
    }

    pub fn is_recording(&self) -> bool {
        self.active_capture.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.active_playback.is_some()
    }

    /// Start capturing into a new timestamped file
    ///
    /// Rejected while a recording is in progress. If the capture resource
    /// cannot be acquired or started the session stays idle and no file is
    /// left behind.
    pub fn start_recording(&mut self) -> RecorderResult<PathBuf> {
        if let Some(active) = &self.active_capture {
            warn!("Recording already started: {}", active.path.display());
            return Err(RecorderError::AlreadyRecording(active.path.clone()));
        }

        let started_at = Utc::now();
        let path = self
            .store
            .next_output_path(started_at)
            .map_err(RecorderError::storage)?;

        let mut stream = match self.capture.open(&path, &self.profile) {
            Ok(stream) => stream,
            Err(e) => {
                error!("Failed to acquire capture resource: {:#}", e);
                self.store.discard(&path);
                return Err(RecorderError::capture(e));
            }
        };

        if let Err(e) = stream.start() {
            error!("Failed to start capture: {:#}", e);
            drop(stream);
            self.store.discard(&path);
            return Err(RecorderError::capture(e));
        }

        info!("Recording started: {}", path.display());

        self.active_capture = Some(ActiveCapture {
            stream,
            path: path.clone(),
            started_at,
        });

        Ok(path)
    }

    /// Finalize the in-progress recording and release the capture resource
    ///
    /// The session is idle afterwards even if finalizing fails.
    pub fn stop_recording(&mut self) -> RecorderResult<Recording> {
        let Some(active) = self.active_capture.take() else {
            warn!("Recording not active");
            return Err(RecorderError::NotRecording);
        };

        let elapsed = Utc::now().signed_duration_since(active.started_at);

        if let Err(e) = active.stream.finish() {
            error!(
                "Failed to finalize recording {}: {:#}",
                active.path.display(),
                e
            );
            return Err(RecorderError::capture(e));
        }

        info!(
            "Recording stopped: {} ({:.1}s)",
            active.path.display(),
            elapsed.num_milliseconds() as f64 / 1000.0
        );

        Ok(Recording::from_path(active.path))
    }

    /// Recordings currently in the output directory
    pub fn list_recordings(&self) -> RecorderResult<Vec<Recording>> {
        self.store.list().map_err(RecorderError::storage)
    }

    /// Play `path`, releasing any previous playback first
    ///
    /// On failure no playback resource is held.
    pub fn play_recording(&mut self, path: impl AsRef<Path>) -> RecorderResult<()> {
        let path = path.as_ref();

        self.stop_playback();

        let mut stream = self.playback.open(path).map_err(|e| {
            error!("Failed to open {} for playback: {:#}", path.display(), e);
            RecorderError::playback(path, e)
        })?;

        stream.start().map_err(|e| {
            error!("Failed to start playback of {}: {:#}", path.display(), e);
            RecorderError::playback(path, e)
        })?;

        info!("Playing recording: {}", path.display());

        self.active_playback = Some(ActivePlayback {
            stream,
            path: path.to_path_buf(),
        });

        Ok(())
    }

    /// Release the playback resource; returns whether one was held
    pub fn stop_playback(&mut self) -> bool {
        match self.active_playback.take() {
            Some(previous) => {
                debug!("Releasing playback of {}", previous.path.display());
                drop(previous);
                true
            }
            None => false,
        }
    }

    /// Whether the active playback has played to the end
    pub fn playback_finished(&self) -> bool {
        self.active_playback
            .as_ref()
            .map(|p| p.stream.is_finished())
            .unwrap_or(false)
    }

    pub fn stats(&self) -> SessionStats {
        let elapsed = self
            .active_capture
            .as_ref()
            .map(|c| Utc::now().signed_duration_since(c.started_at).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        SessionStats {
            is_recording: self.is_recording(),
            recording_path: self.active_capture.as_ref().map(|c| c.path.clone()),
            recording_started_at: self.active_capture.as_ref().map(|c| c.started_at),
            recording_elapsed_secs: elapsed,
            playback_active: self.is_playing(),
            playback_path: self.active_playback.as_ref().map(|p| p.path.clone()),
            playback_finished: self.playback_finished(),
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.active_capture.is_some() {
            warn!("Session dropped while recording, finalizing");
            if let Err(e) = self.stop_recording() {
                error!("Failed to finalize recording on drop: {}", e);
            }
        }
        self.stop_playback();
    }
}
