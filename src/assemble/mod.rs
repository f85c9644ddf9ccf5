//! Graph assembly: ownership + call aggregation + optional semantic grouping.
//!
//! ```text
//! files ──► owner::resolve (per file) ──► nodes + OwnerMap ─┐
//!   │                                                      ├──► Graph
//!   └──► LocationIndex ──► edges::aggregate (concurrent) ──┘
//! ```

pub mod edges;
pub mod owner;

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::DEFAULT_GROUP;
use crate::entity::index::LocationIndex;
use crate::entity::FileEntities;
use crate::graph::{Graph, GraphNode, NodeId, NodeKind};
use crate::ports::CallProvider;

pub use edges::{AggregationStats, EdgeAccumulator};
pub use owner::{Granularity, OwnerMap, Ownership};

/// Inputs shaping one assembly besides the files themselves.
#[derive(Debug, Clone, Copy)]
pub struct AssembleOptions<'a> {
    /// Containment level.
    pub granularity: Granularity,
    /// File → group name; one container is synthesized per distinct group.
    pub semantic_groups: Option<&'a BTreeMap<String, String>>,
    /// Label of a synthesized root that adopts every top-level node.
    pub virtual_root_label: Option<&'a str>,
    /// Group for files missing from `semantic_groups`.
    pub default_group: &'a str,
}

impl Default for AssembleOptions<'_> {
    fn default() -> Self {
        Self {
            granularity: Granularity::Full,
            semantic_groups: None,
            virtual_root_label: None,
            default_group: DEFAULT_GROUP,
        }
    }
}

/// Result of [`assemble`].
#[derive(Debug, Clone)]
pub struct Assembly {
    /// The assembled node/edge graph.
    pub graph: Graph,
    /// Entity → owner assignments across the batch.
    pub owners: OwnerMap,
    /// Aggregation counters.
    pub stats: AggregationStats,
}

/// Assembles one graph from a batch of files.
///
/// Identical inputs yield an identical node id set and edge weight set.
pub async fn assemble(
    calls: &dyn CallProvider,
    files: &[FileEntities],
    options: &AssembleOptions<'_>,
) -> Assembly {
    let mut nodes: BTreeMap<NodeId, GraphNode> = BTreeMap::new();
    let mut container_files: BTreeMap<NodeId, Vec<String>> = BTreeMap::new();

    let root_id = options.virtual_root_label.map(|label| {
        let id = NodeId::for_root(label);
        nodes.insert(id.clone(), GraphNode::new(id.clone(), label, NodeKind::Module));
        id
    });

    let group_kind =
        if options.granularity == Granularity::Process { NodeKind::System } else { NodeKind::Module };

    let mut owners = OwnerMap::new();
    let mut callables = Vec::new();

    for file in files {
        let container = match options.semantic_groups {
            Some(groups) => {
                let name = groups
                    .get(&file.path)
                    .map(|g| g.trim())
                    .filter(|g| !g.is_empty())
                    .unwrap_or(options.default_group);
                let id = NodeId::for_group(name);
                nodes.entry(id.clone()).or_insert_with(|| {
                    GraphNode::new(id.clone(), name, group_kind).with_parent(root_id.clone())
                });
                Some(id)
            }
            None => root_id.clone(),
        };

        let ownership = owner::resolve(file, options.granularity, container.as_ref());
        let owning = container.unwrap_or_else(NodeId::synthetic_root);
        container_files.entry(owning).or_default().push(file.path.clone());

        for node in ownership.nodes {
            nodes.entry(node.id.clone()).or_insert(node);
        }
        owners.merge(ownership.owners);
        callables.extend(ownership.callables);
    }

    if let Some(root) = &root_id {
        for node in nodes.values_mut() {
            if node.parent_id.is_none() && &node.id != root {
                node.parent_id = Some(root.clone());
            }
        }
        container_files.entry(root.clone()).or_default().extend(files.iter().map(|f| f.path.clone()));
    }

    for (id, paths) in container_files {
        if let Some(node) = nodes.get_mut(&id) {
            for path in paths {
                if !node.source_files.contains(&path) {
                    node.source_files.push(path);
                }
            }
        }
    }

    let index = LocationIndex::build(files);
    let (edges, stats) = edges::aggregate(calls, &callables, &index, &owners).await;

    debug!(
        files = files.len(),
        nodes = nodes.len(),
        edges = edges.len(),
        granularity = ?options.granularity,
        "assembled graph"
    );

    Assembly { graph: Graph::new(nodes.into_values().collect(), edges), owners, stats }
}
