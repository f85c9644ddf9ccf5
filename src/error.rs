//! Error taxonomy of the graph engine.
//!
//! None of these are fatal: structural problems are recovered by falling back
//! to a synthetic root, collaborator problems by the drill-down fallback chain.
//! A response that lost a race is not an error at all, see
//! [`crate::drill::ApplyOutcome::Discarded`].

use thiserror::Error;

use crate::graph::NodeId;

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures raised inside the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An entity could not be matched to a file or owner.
    #[error("structural: {0}")]
    Structural(String),

    /// An external collaborator call failed or timed out.
    #[error("collaborator `{collaborator}` failed: {message}")]
    Collaborator {
        /// Which collaborator failed.
        collaborator: &'static str,
        /// What it reported.
        message: String,
    },

    /// A collaborator answered with something too small to be useful.
    #[error("trivial result from `{collaborator}`: {nodes} node(s)")]
    TrivialResult {
        /// Which collaborator answered.
        collaborator: &'static str,
        /// How many nodes it produced.
        nodes: usize,
    },

    /// The node exists but cannot be drilled into.
    #[error("node {0} cannot be drilled into")]
    NotDrillable(NodeId),

    /// The node is not part of the displayed graph.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Every strategy of a fallback chain failed.
    #[error("no view could be produced for {target}: {last}")]
    Exhausted {
        /// Node that was drilled.
        target: NodeId,
        /// The last strategy failure.
        last: String,
    },

    /// Configuration could not be loaded.
    #[error("config: {0}")]
    Config(String),
}

impl EngineError {
    /// Whether the fallback chain should move on to the next tier.
    ///
    /// Collaborator failures and trivial results are treated identically.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Collaborator { .. } | Self::TrivialResult { .. } | Self::Structural(_))
    }
}
