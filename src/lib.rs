//! Hierarchical architecture graphs for codebases.
//!
//! A project is scanned into per-file entity trees, assembled into a
//! node/edge graph at one of three granularities, laid out as nested boxes
//! and explored by drilling from subsystems into process flows and
//! component graphs. Every external collaborator sits behind a port in
//! [`ports`] with live, recording and replaying adapters.

pub mod adapters;
pub mod assemble;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod drill;
pub mod entity;
pub mod error;
pub mod graph;
pub mod inference;
pub mod layout;
pub mod ports;
pub mod workspace;

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
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
