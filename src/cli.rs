//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `issue-mirror`.
#[derive(Debug, Parser)]
#[command(
    name = "issue-mirror",
    version,
    about = "Mirror open GitHub issues and pull requests into Discord channels"
)]
pub struct Cli {
    /// Tracking state file; overrides `MIRROR_STATE_FILE`.
    #[arg(long, global = true, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile on an interval and answer operator commands until Ctrl-C.
    Run,
    /// Run a single reconciliation pass and exit.
    Refresh,
    /// Show tracked counts and the mirrored repository.
    Status,
    /// Forget every tracked item. Posted messages stay in place.
    #[command(alias = "clear-tracking")]
    Clear,
}
