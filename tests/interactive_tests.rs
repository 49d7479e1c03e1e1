// Integration tests for the interactive front end
//
// Commands are fed from an in-memory script and the printed notices are
// checked, mirroring how a user drives the start/stop buttons and list.

mod common;

use anyhow::Result;
use common::{CaptureFailure, MockCaptureDevice, MockPlaybackDevice};
use loqa_memos::cli::run_interactive;
use loqa_memos::{RecordingSession, SessionConfig};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

fn run_script(
    dir: &Path,
    capture: &MockCaptureDevice,
    playback: &MockPlaybackDevice,
    script: &str,
) -> Result<String> {
    let mut session = RecordingSession::with_devices(
        SessionConfig::new(dir),
        Box::new(capture.clone()),
        Box::new(playback.clone()),
    );
    let mut out = Vec::new();
    run_interactive(&mut session, Cursor::new(script.as_bytes()), &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn test_record_list_and_play() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let capture = MockCaptureDevice::new();
    let playback = MockPlaybackDevice::new();

    let output = run_script(
        temp_dir.path(),
        &capture,
        &playback,
        "start\nstart\nstop\nstop\nplay 1\nquit\n",
    )?;

    assert!(output.contains("No recordings"));
    assert!(output.contains("Recording started"));
    assert!(output.contains("Already recording"));
    assert!(output.contains("Recording stopped"));
    assert!(output.contains("Not recording"));
    assert!(output.contains("  1. "));
    assert!(output.contains("Playing recording"));
    assert_eq!(capture.opens(), 1);
    assert_eq!(playback.acquired(), 1);
    assert_eq!(playback.released(), 1, "Playback released on quit");
    Ok(())
}

#[test]
fn test_end_of_input_stops_recording() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let capture = MockCaptureDevice::new();
    let playback = MockPlaybackDevice::new();

    let output = run_script(temp_dir.path(), &capture, &playback, "start\n")?;

    assert!(output.ends_with("Recording stopped\n"));
    assert_eq!(capture.releases(), 1);
    Ok(())
}

#[test]
fn test_failures_are_reported_not_fatal() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let capture = MockCaptureDevice::failing(CaptureFailure::Open);
    let playback = MockPlaybackDevice::new();

    let output = run_script(
        temp_dir.path(),
        &capture,
        &playback,
        "start\nplay 7\nfrobnicate\nplay\nstatus\n",
    )?;

    assert!(output.contains("Recording failed"));
    assert!(output.contains("Playback failed"));
    assert!(output.contains("Unknown command: frobnicate"));
    assert!(output.contains("Usage: play"));
    assert!(output.contains("Recording: idle"));
    assert!(output.contains("Playback: idle"));
    Ok(())
}
