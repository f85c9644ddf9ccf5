//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::assemble::Granularity;

/// Top-level CLI parser for `archscope`.
#[derive(Debug, Parser)]
#[command(name = "archscope", version, about = "Explore the architecture of a codebase as a graph")]
pub struct Cli {
    /// Project root to analyze.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the assembled overview graph as JSON.
    Graph {
        /// Containment level of the graph.
        #[arg(long, value_enum, default_value_t = Granularity::Full)]
        granularity: Granularity,
        /// Synthesize a root node with this label adopting every group.
        #[arg(long)]
        root_label: Option<String>,
    },
    /// Print the laid-out overview as JSON.
    Layout {
        /// Containment level of the graph.
        #[arg(long, value_enum, default_value_t = Granularity::Full)]
        granularity: Granularity,
        /// Container to show expanded (repeatable).
        #[arg(long = "expand", value_name = "NODE_ID")]
        expand: Vec<String>,
    },
    /// Drill from the process overview through the given nodes.
    Drill {
        /// Node ids to drill into, outermost first.
        #[arg(required = true, value_name = "NODE_ID")]
        path: Vec<String>,
    },
    /// Print the source of the innermost entity enclosing a line.
    Preview {
        /// File relative to the project root.
        file: String,
        /// Zero-based line inside the entity.
        line: u32,
    },
}
