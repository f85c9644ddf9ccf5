//! Navigation stack and expansion state owned by the orchestrator.

use std::collections::BTreeSet;

use crate::graph::{Graph, NodeId};

/// A displayed graph and its label, saved when drilling deeper.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFrame {
    /// The graph as it was displayed.
    pub graph: Graph,
    /// Breadcrumb label.
    pub label: String,
}

impl ViewFrame {
    /// Creates a frame.
    pub fn new(graph: Graph, label: impl Into<String>) -> Self {
        Self { graph, label: label.into() }
    }
}

/// Frames above the current view, innermost last.
#[derive(Debug, Clone, Default)]
pub struct NavigationStack {
    frames: Vec<ViewFrame>,
}

impl NavigationStack {
    /// Saves a frame.
    pub fn push(&mut self, frame: ViewFrame) {
        self.frames.push(frame);
    }

    /// Removes the innermost saved frame.
    pub fn pop(&mut self) -> Option<ViewFrame> {
        self.frames.pop()
    }

    /// Number of saved frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether the current view is the top level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Labels of the saved frames, outermost first.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|f| f.label.as_str())
    }
}

/// The set of expanded container ids.
///
/// Survives background refreshes; cleared when the displayed frame changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: BTreeSet<NodeId>,
}

impl ExpansionState {
    /// Expands `id`.
    pub fn expand(&mut self, id: NodeId) {
        self.expanded.insert(id);
    }

    /// Collapses `id`.
    pub fn collapse(&mut self, id: &NodeId) {
        self.expanded.remove(id);
    }

    /// Flips `id` and returns whether it is now expanded.
    pub fn toggle(&mut self, id: &NodeId) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    /// Whether `id` is expanded.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    /// Collapses everything.
    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    /// Whether nothing is expanded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    /// The expanded ids, as consumed by [`crate::layout::layout`].
    #[must_use]
    pub fn ids(&self) -> &BTreeSet<NodeId> {
        &self.expanded
    }
}
