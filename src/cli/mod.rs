pub mod args;
pub mod interactive;

pub use args::{Cli, CliCommand, InfoCliArgs, ListCliArgs, PlayCliArgs, RecordCliArgs};
pub use interactive::{parse_command, run_interactive, ReplCommand};

use anyhow::{Context, Result};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::info;

use crate::audio::AudioFile;
use crate::recording::Recording;
use crate::session::RecordingSession;

const PLAYBACK_POLL: Duration = Duration::from_millis(100);

/// Map a 1-based number from a listing to its path; anything else is taken as a path
pub fn resolve_target(target: &str, listing: &[Recording]) -> PathBuf {
    match target.parse::<usize>() {
        Ok(n) if n >= 1 && n <= listing.len() => listing[n - 1].path.clone(),
        _ => PathBuf::from(target),
    }
}

pub fn format_entry(number: usize, recording: &Recording) -> String {
    match recording.created_at {
        Some(created) => format!(
            "{:>3}. {}  ({})",
            number,
            recording.path.display(),
            created.format("%Y-%m-%d %H:%M:%S")
        ),
        None => format!("{:>3}. {}", number, recording.path.display()),
    }
}

pub fn handle_record_command(args: RecordCliArgs, session: &mut RecordingSession) -> Result<()> {
    let path = session.start_recording()?;
    println!("Recording started: {}", path.display());

    match args.seconds {
        Some(seconds) => {
            info!("Recording for {}s", seconds);
            thread::sleep(Duration::from_secs(seconds));
        }
        None => {
            println!("Press Enter to stop");
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read from stdin")?;
        }
    }

    let recording = session.stop_recording()?;
    println!("Recording stopped: {}", recording.path.display());
    Ok(())
}

pub fn handle_list_command(args: ListCliArgs, session: &RecordingSession) -> Result<()> {
    let recordings = session.list_recordings()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&recordings)?);
        return Ok(());
    }

    if recordings.is_empty() {
        println!("No recordings in {}", session.store().dir().display());
    }
    for (i, recording) in recordings.iter().enumerate() {
        println!("{}", format_entry(i + 1, recording));
    }
    Ok(())
}

pub fn handle_play_command(args: PlayCliArgs, session: &mut RecordingSession) -> Result<()> {
    let listing = session.list_recordings()?;
    let path = resolve_target(&args.target, &listing);

    session.play_recording(&path)?;
    println!("Playing recording: {}", path.display());

    if !args.no_wait {
        while !session.playback_finished() {
            thread::sleep(PLAYBACK_POLL);
        }
        // Let the device drain its last buffer
        thread::sleep(PLAYBACK_POLL);
        session.stop_playback();
    }
    Ok(())
}

pub fn handle_info_command(args: InfoCliArgs) -> Result<()> {
    let audio = AudioFile::open(&args.path)?;
    println!("Path: {}", audio.path);
    println!("Duration: {:.2}s", audio.duration_seconds);
    println!("Sample rate: {}Hz", audio.sample_rate);
    println!("Channels: {}", audio.channels);
    println!("Total samples: {}", audio.samples.len());
    Ok(())
}

pub fn handle_interactive_command(session: &mut RecordingSession) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_interactive(session, stdin.lock(), &mut stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<Recording> {
        vec![
            Recording::from_path("/memos/audio_record_1.wav"),
            Recording::from_path("/memos/audio_record_2.wav"),
        ]
    }

    #[test]
    fn test_resolve_number_from_listing() {
        assert_eq!(
            resolve_target("2", &listing()),
            PathBuf::from("/memos/audio_record_2.wav")
        );
    }

    #[test]
    fn test_resolve_out_of_range_number_is_a_path() {
        assert_eq!(resolve_target("0", &listing()), PathBuf::from("0"));
        assert_eq!(resolve_target("3", &listing()), PathBuf::from("3"));
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            resolve_target("/elsewhere/a.wav", &listing()),
            PathBuf::from("/elsewhere/a.wav")
        );
    }

    #[test]
    fn test_format_entry_includes_timestamp() {
        let entry = format_entry(1, &Recording::from_path("/m/audio_record_0.wav"));
        assert_eq!(entry, "  1. /m/audio_record_0.wav  (1970-01-01 00:00:00)");
    }
}
