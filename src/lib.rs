//! Core library entry for the `issue-mirror` CLI.
//!
//! Keeps one Discord channel per item type in sync with the open issues and
//! pull requests of a GitHub repository. See [`reconcile`] for the algorithm
//! and [`service::MirrorService`] for the entry point used by the CLI.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod daemon;
pub mod error;
pub mod logging;
pub mod model;
pub mod operator;
pub mod ports;
pub mod present;
pub mod reconcile;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        // --help and --version
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli)
}
