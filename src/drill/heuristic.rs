//! Deterministic process flow used when inference is unavailable.

use crate::entity::file_name;
use crate::graph::{Edge, Graph, GraphNode, NodeId, NodeKind};

/// Builds `start → step per file → end` for the first `cap` files.
///
/// Each step is a drillable process node carrying its file. Returns `None`
/// when there are no files or the cap is zero.
#[must_use]
pub fn heuristic_flow(scope: &NodeId, label: &str, files: &[String], cap: usize) -> Option<Graph> {
    let steps: Vec<&String> = files.iter().take(cap).collect();
    if steps.is_empty() {
        return None;
    }

    let start = NodeId::scoped(scope, "start");
    let end = NodeId::scoped(scope, "end");
    let mut nodes = vec![GraphNode::new(start.clone(), format!("Enter {label}"), NodeKind::Start)];
    for (i, file) in steps.iter().enumerate() {
        nodes.push(
            GraphNode::new(
                NodeId::scoped(scope, &format!("step-{}", i + 1)),
                file_name(file),
                NodeKind::Process,
            )
            .with_files(vec![(*file).clone()])
            .with_attribute("description", file.as_str()),
        );
    }
    nodes.push(GraphNode::new(end, format!("Leave {label}"), NodeKind::End));

    let edges = nodes
        .windows(2)
        .map(|pair| Edge::new(pair[0].id.clone(), pair[1].id.clone()))
        .collect();
    Some(Graph::new(nodes, edges))
}
