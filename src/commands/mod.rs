//! Command dispatch and handlers.

pub mod clear;
pub mod refresh;
pub mod run;
pub mod status;

use std::path::PathBuf;

use tracing::info;

use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::logging;
use crate::service::MirrorService;

/// Dispatch a parsed command line to its handler.
///
/// Reads the configuration from the environment, installs logging, and
/// builds a live context. When `MIRROR_RECORD` names a directory every port
/// interaction is recorded into a new session below it.
///
/// # Errors
///
/// Returns an error string if the configuration is invalid or the command fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let mut config = Config::from_env().map_err(|e| e.to_string())?;
    if let Some(path) = &cli.state_file {
        config.state_file.clone_from(path);
    }
    logging::init(config.log_format);

    let (ctx, session) = match config.record_dir.clone() {
        Some(dir) => {
            let (ctx, session) = ServiceContext::recording_at(&config, dir)?;
            (ctx, Some(session))
        }
        None => (ServiceContext::live(&config), None),
    };

    let service = MirrorService::new(ctx, config);
    let result = dispatch_with_service(&cli.command, &service);

    // Finish recording even when the command failed.
    if let Some(session) = session {
        drop(service);
        finish_recording(session)?;
    }

    result
}

/// Runs `command` against an already built service.
///
/// # Errors
///
/// Returns an error string if the runtime cannot start or the command fails.
pub fn dispatch_with_service(command: &Command, service: &MirrorService) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    match command {
        Command::Run => runtime.block_on(run::run(service)),
        Command::Refresh => runtime.block_on(refresh::run(service)),
        Command::Status => status::run(service),
        Command::Clear => runtime.block_on(clear::run(service)),
    }
}

fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir: PathBuf = session.finish()?;
    info!(dir = %output_dir.display(), "recording saved");
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
