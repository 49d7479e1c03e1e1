use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "loqa-memos")]
#[command(about = "Record, list and play back voice memos", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (extension optional; missing file means defaults)
    #[arg(short, long, global = true, default_value = "config/loqa-memos")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Interactive recorder (default): start, stop, list, play
    Interactive,
    /// Record a single memo
    Record(RecordCliArgs),
    /// List existing recordings
    List(ListCliArgs),
    /// Play a recording by path or by its number in `list`
    Play(PlayCliArgs),
    /// Show duration and format of an audio file
    Info(InfoCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct RecordCliArgs {
    /// Stop automatically after this many seconds instead of waiting for Enter
    #[arg(short, long)]
    pub seconds: Option<u64>,
}

#[derive(ClapArgs, Debug)]
pub struct ListCliArgs {
    /// Print recordings as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug)]
pub struct PlayCliArgs {
    /// Path to a recording, or its 1-based number in `list`
    pub target: String,
    /// Return as soon as playback has started
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(ClapArgs, Debug)]
pub struct InfoCliArgs {
    pub path: PathBuf,
}
