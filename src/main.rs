use anyhow::Result;
use clap::Parser;
use loqa_memos::cli::{
    handle_info_command, handle_interactive_command, handle_list_command, handle_play_command,
    handle_record_command, Cli, CliCommand,
};
use loqa_memos::{
    ensure_permissions, Config, HostPermissions, Permission, RecorderError, RecordingSession,
    SessionConfig,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cfg = Config::load(&cli.config).map_err(|e| RecorderError::Config(format!("{:#}", e)))?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Recordings directory: {}", cfg.recordings_dir().display());

    let command = cli.command.unwrap_or(CliCommand::Interactive);

    let required: &[Permission] = match command {
        // Inspecting a file needs neither the microphone nor the recordings directory
        CliCommand::Info(_) => &[],
        CliCommand::List(_) | CliCommand::Play(_) => &[Permission::Storage],
        _ => &[Permission::Microphone, Permission::Storage],
    };

    let permissions = HostPermissions::new(cfg.recordings_dir());
    if let Err(e) = ensure_permissions(&permissions, required) {
        error!("{}", e);
        eprintln!("Permissions not granted");
        std::process::exit(1);
    }

    let mut session = RecordingSession::new(SessionConfig::from(&cfg));

    match command {
        CliCommand::Interactive => handle_interactive_command(&mut session),
        CliCommand::Record(args) => handle_record_command(args, &mut session),
        CliCommand::List(args) => handle_list_command(args, &session),
        CliCommand::Play(args) => handle_play_command(args, &mut session),
        CliCommand::Info(args) => handle_info_command(args),
    }
}
