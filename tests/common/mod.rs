// Mock host audio devices shared by the integration tests
//
// The capture mock writes a real WAV file through hound so recordings
// produced in tests are playable; the playback mock records every
// acquire/release so resource discipline can be asserted.

#![allow(dead_code)]

use anyhow::{bail, Context, Result};
use loqa_memos::{CaptureDevice, CaptureStream, EncodingProfile, PlaybackDevice, PlaybackStream};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared log of device events, in order
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureFailure {
    None,
    Open,
    Start,
}

#[derive(Clone)]
pub struct MockCaptureDevice {
    pub opens: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
    pub failure: CaptureFailure,
}

impl MockCaptureDevice {
    pub fn new() -> Self {
        Self::failing(CaptureFailure::None)
    }

    pub fn failing(failure: CaptureFailure) -> Self {
        Self {
            opens: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
            failure,
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl CaptureDevice for MockCaptureDevice {
    fn open(&self, output: &Path, profile: &EncodingProfile) -> Result<Box<dyn CaptureStream>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.failure == CaptureFailure::Open {
            bail!("mock microphone unavailable");
        }

        let writer = hound::WavWriter::create(output, profile.wav_spec())
            .context("Failed to create WAV file")?;

        Ok(Box::new(MockCaptureStream {
            writer: Some(writer),
            fail_start: self.failure == CaptureFailure::Start,
            releases: Arc::clone(&self.releases),
            frame_len: (profile.sample_rate / 10) as usize * profile.channels as usize,
        }))
    }

    fn name(&self) -> &str {
        "mock microphone"
    }
}

struct MockCaptureStream {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    fail_start: bool,
    releases: Arc<AtomicUsize>,
    frame_len: usize,
}

impl CaptureStream for MockCaptureStream {
    fn start(&mut self) -> Result<()> {
        if self.fail_start {
            bail!("mock microphone refused to start");
        }
        // 100ms of a ramp stands in for captured audio
        if let Some(writer) = self.writer.as_mut() {
            for i in 0..self.frame_len {
                writer.write_sample((i % 1000) as i16)?;
            }
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }
}

impl Drop for MockCaptureStream {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            let _ = writer.finalize();
        }
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct MockPlaybackDevice {
    pub events: EventLog,
    pub acquired: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    /// Fail `start` for every stream
    pub fail_start: bool,
}

impl MockPlaybackDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl PlaybackDevice for MockPlaybackDevice {
    fn open(&self, path: &Path) -> Result<Box<dyn PlaybackStream>> {
        if !path.is_file() {
            bail!("No such recording: {}", path.display());
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.events.push(format!("acquire {}", file_name(path)));

        Ok(Box::new(MockPlaybackStream {
            path: path.to_path_buf(),
            started: false,
            fail_start: self.fail_start,
            events: self.events.clone(),
            released: Arc::clone(&self.released),
        }))
    }

    fn name(&self) -> &str {
        "mock speaker"
    }
}

struct MockPlaybackStream {
    path: PathBuf,
    started: bool,
    fail_start: bool,
    events: EventLog,
    released: Arc<AtomicUsize>,
}

impl PlaybackStream for MockPlaybackStream {
    fn start(&mut self) -> Result<()> {
        if self.fail_start {
            bail!("mock speaker refused to start");
        }
        self.started = true;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.started
    }
}

impl Drop for MockPlaybackStream {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.events.push(format!("release {}", file_name(&self.path)));
    }
}

/// Write a 16kHz mono WAV of `samples` length to `path`
pub fn write_wav(path: &Path, samples: usize) -> Result<()> {
    let mut writer = hound::WavWriter::create(path, EncodingProfile::default().wav_spec())?;
    for i in 0..samples {
        writer.write_sample(((i % 200) as i16 - 100) * 100)?;
    }
    writer.finalize()?;
    Ok(())
}
