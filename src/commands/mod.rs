//! Command dispatch and handlers.

pub mod drill;
pub mod graph;
pub mod layout;
pub mod preview;

use std::env;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command};
use crate::config::EngineConfig;
use crate::context::ServiceContext;

/// What every command handler works against.
pub struct Workspace<'a> {
    /// Port implementations.
    pub ctx: &'a ServiceContext,
    /// Project root.
    pub root: &'a Path,
    /// Engine tunables.
    pub config: &'a EngineConfig,
}

/// Dispatch a parsed command line to its handler and print the result.
///
/// When `ARCHSCOPE_RECORD` is set to a directory path, all port interactions
/// are recorded to per-port cassette files in that directory.
///
/// # Errors
///
/// Returns an error string if configuration loading or the selected command
/// handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let config = EngineConfig::load(&cli.root).map_err(|e| e.to_string())?;

    let (ctx, session) = if let Ok(path) = env::var("ARCHSCOPE_RECORD") {
        let (ctx, session) = ServiceContext::recording_at(PathBuf::from(path), &cli.root, &config)?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(&cli.root, &config), None)
    };

    let workspace = Workspace { ctx: &ctx, root: &cli.root, config: &config };
    let result = block_on(dispatch_with_context(&cli.command, &workspace)).and_then(|outcome| outcome);

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        drop(ctx);
        finish_recording(session)?;
    }

    print_json(&result?)
}

/// Dispatch a command against the given workspace.
///
/// # Errors
///
/// Returns an error string if the handler fails.
pub async fn dispatch_with_context(command: &Command, workspace: &Workspace<'_>) -> Result<Value, String> {
    match command {
        Command::Graph { granularity, root_label } => {
            graph::run(workspace, *granularity, root_label.as_deref()).await
        }
        Command::Layout { granularity, expand } => layout::run(workspace, *granularity, expand).await,
        Command::Drill { path } => drill::run(workspace, path).await,
        Command::Preview { file, line } => preview::run(workspace, file, *line).await,
    }
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;
    Ok(runtime.block_on(future))
}

fn print_json(value: &Value) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to render output: {e}"))?;
    println!("{rendered}");
    Ok(())
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
