//! Graph data model shared by the assembler, the drill-down orchestrator and
//! the layout engine.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a [`GraphNode`].
///
/// Entity-backed ids are derived from `(file, name, start line)` so the same
/// snapshot always yields the same id set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wraps an already-formed id string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Id of the node representing the entity `name` declared at `line` of `file`.
    #[must_use]
    pub fn for_entity(file: &str, name: &str, line: u32) -> Self {
        Self(format!("{file}#{name}@{line}"))
    }

    /// Id of the node representing a whole file.
    #[must_use]
    pub fn for_file(file: &str) -> Self {
        Self(format!("file:{file}"))
    }

    /// Id of a synthesized semantic-group container.
    #[must_use]
    pub fn for_group(group: &str) -> Self {
        Self(format!("group:{group}"))
    }

    /// Id of a synthesized virtual root labelled `label`.
    #[must_use]
    pub fn for_root(label: &str) -> Self {
        Self(format!("root:{label}"))
    }

    /// Id of the fallback container used when nothing else owns an entity.
    #[must_use]
    pub fn synthetic_root() -> Self {
        Self("root:".to_string())
    }

    /// Id of a node that only exists inside the view drilled from `scope`.
    #[must_use]
    pub fn scoped(scope: &NodeId, local: &str) -> Self {
        Self(format!("{}/{local}", scope.0))
    }

    /// Borrow the raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Visual role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A top-level subsystem; drilling in requests a process flow.
    System,
    /// A semantic or structural grouping container.
    Module,
    /// A source file.
    File,
    /// A class, interface, function or constant.
    Component,
    /// A step of a process flow; drilling in requests a component graph.
    Process,
    /// A branching step of a process flow.
    Decision,
    /// Entry of a process flow.
    Start,
    /// Exit of a process flow.
    End,
    /// A persistence step of a process flow.
    Database,
}

impl NodeKind {
    /// Parses the kind names used by process-flow inference.
    ///
    /// Unknown names map to [`NodeKind::Process`].
    #[must_use]
    pub fn from_flow_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "end" => Self::End,
            "decision" => Self::Decision,
            "database" | "db" => Self::Database,
            "system" => Self::System,
            _ => Self::Process,
        }
    }

    /// Whether activating a node of this kind issues a drill-down request.
    #[must_use]
    pub fn is_drillable(self) -> bool {
        matches!(self, Self::System | Self::Process)
    }
}

/// A position in a source file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File path relative to the project root.
    pub file: String,
    /// Zero-based first line of the range.
    pub start_line: u32,
    /// Zero-based last line of the range.
    pub end_line: u32,
}

/// A node of the architecture graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable identifier.
    pub id: NodeId,
    /// Display label.
    pub label: String,
    /// Visual role.
    pub kind: NodeKind,
    /// Containing node, `None` for roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// Files whose contents this node stands for.
    #[serde(default)]
    pub source_files: Vec<String>,
    /// Source range for entity-backed nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    /// Free-form attributes (entity kind, description, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl GraphNode {
    /// Creates a parentless node with no files or attributes.
    pub fn new(id: NodeId, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            label: label.into(),
            kind,
            parent_id: None,
            source_files: Vec::new(),
            location: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Sets the parent.
    #[must_use]
    pub fn with_parent(mut self, parent: Option<NodeId>) -> Self {
        self.parent_id = parent;
        self
    }

    /// Sets the source files.
    #[must_use]
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.source_files = files;
        self
    }

    /// Sets the source location and records its file.
    #[must_use]
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        if !self.source_files.contains(&location.file) {
            self.source_files.push(location.file.clone());
        }
        self.location = Some(location);
        self
    }

    /// Adds one attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Longer text shown under the label, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.attributes.get("description").map(String::as_str)
    }
}

/// Aggregated relationship between two owners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Calling owner.
    pub source_id: NodeId,
    /// Called owner.
    pub target_id: NodeId,
    /// Number of underlying calls.
    pub weight: u32,
    /// One entry per distinct underlying call description.
    #[serde(default)]
    pub detail: Vec<String>,
    /// Optional display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    /// Creates a weight-1 edge with no detail.
    #[must_use]
    pub fn new(source_id: NodeId, target_id: NodeId) -> Self {
        Self { source_id, target_id, weight: 1, detail: Vec::new(), label: None }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }
}

/// A node/edge payload as published to the visualization layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// All nodes, forming a forest through `parent_id`.
    pub nodes: Vec<GraphNode>,
    /// Deduplicated edges between nodes.
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Creates a graph from its parts.
    #[must_use]
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Whether any node names `id` as its parent.
    #[must_use]
    pub fn has_children(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| n.parent_id.as_ref() == Some(id))
    }

    /// The set of node ids.
    #[must_use]
    pub fn node_ids(&self) -> BTreeSet<NodeId> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    /// Edge weights keyed by ordered endpoint pair.
    #[must_use]
    pub fn edge_weights(&self) -> BTreeMap<(NodeId, NodeId), u32> {
        self.edges
            .iter()
            .map(|e| ((e.source_id.clone(), e.target_id.clone()), e.weight))
            .collect()
    }

    /// Whether the graph has nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
