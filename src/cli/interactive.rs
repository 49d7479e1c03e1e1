// Line-oriented front end: the start/stop buttons and the tap-to-play list

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::{debug, error};

use super::resolve_target;
use crate::error::RecorderError;
use crate::recording::Recording;
use crate::session::RecordingSession;

const HELP: &str = "\
Commands:
  start          start recording
  stop           stop recording
  list           list recordings
  play <n|path>  play a recording by number or path
  status         show what is recording or playing
  help           show this help
  quit           stop everything and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Start,
    Stop,
    List,
    Play(String),
    Status,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<ReplCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "start" | "record" => ReplCommand::Start,
        "stop" => ReplCommand::Stop,
        "list" | "ls" => ReplCommand::List,
        "play" if rest.is_empty() => return Err("Usage: play <n|path>".to_string()),
        "play" => ReplCommand::Play(rest.to_string()),
        "status" => ReplCommand::Status,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => return Err(format!("Unknown command: {} (try `help`)", other)),
    };

    Ok(Some(command))
}

/// Run commands from `input` until `quit` or end of input
pub fn run_interactive<R, W>(session: &mut RecordingSession, input: R, out: &mut W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(out, "Recordings in {}", session.store().dir().display())?;
    let mut listing = show_recordings(session, out)?;
    writeln!(out, "Type `help` for commands.")?;

    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "{}", message)?;
                continue;
            }
        };
        debug!("Interactive command: {:?}", command);

        match command {
            ReplCommand::Start => match session.start_recording() {
                Ok(_) => writeln!(out, "Recording started")?,
                Err(RecorderError::AlreadyRecording(_)) => writeln!(out, "Already recording")?,
                Err(e) => writeln!(out, "Recording failed: {}", e)?,
            },
            ReplCommand::Stop => match session.stop_recording() {
                Ok(_) => {
                    writeln!(out, "Recording stopped")?;
                    listing = show_recordings(session, out)?;
                }
                Err(RecorderError::NotRecording) => writeln!(out, "Not recording")?,
                Err(e) => {
                    writeln!(out, "Recording failed: {}", e)?;
                    listing = show_recordings(session, out)?;
                }
            },
            ReplCommand::List => listing = show_recordings(session, out)?,
            ReplCommand::Play(target) => {
                let path = resolve_target(&target, &listing);
                match session.play_recording(&path) {
                    Ok(()) => writeln!(out, "Playing recording")?,
                    Err(e) => writeln!(out, "Playback failed: {}", e)?,
                }
            }
            ReplCommand::Status => {
                let stats = session.stats();
                match &stats.recording_path {
                    Some(path) => writeln!(
                        out,
                        "Recording: {} ({:.1}s)",
                        path.display(),
                        stats.recording_elapsed_secs
                    )?,
                    None => writeln!(out, "Recording: idle")?,
                }
                match &stats.playback_path {
                    Some(path) if stats.playback_finished => {
                        writeln!(out, "Playback: finished {}", path.display())?
                    }
                    Some(path) => writeln!(out, "Playback: {}", path.display())?,
                    None => writeln!(out, "Playback: idle")?,
                }
            }
            ReplCommand::Help => writeln!(out, "{}", HELP)?,
            ReplCommand::Quit => break,
        }
    }

    if session.is_recording() {
        match session.stop_recording() {
            Ok(_) => writeln!(out, "Recording stopped")?,
            Err(e) => error!("Failed to stop recording on exit: {}", e),
        }
    }
    session.stop_playback();

    Ok(())
}

fn show_recordings<W: Write>(session: &RecordingSession, out: &mut W) -> Result<Vec<Recording>> {
    let recordings = match session.list_recordings() {
        Ok(recordings) => recordings,
        Err(e) => {
            writeln!(out, "Cannot list recordings: {}", e)?;
            return Ok(Vec::new());
        }
    };

    if recordings.is_empty() {
        writeln!(out, "No recordings")?;
    }
    for (i, recording) in recordings.iter().enumerate() {
        writeln!(out, "{}", super::format_entry(i + 1, recording))?;
    }

    Ok(recordings)
}
