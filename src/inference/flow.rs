//! Process-flow inference: describes what a subsystem does as a flow chart.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use super::extract_json;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::{Edge, Graph, GraphNode, NodeId, NodeKind};
use crate::ports::{CompletionRequest, LlmClient};

const COLLABORATOR: &str = "process-flow";

#[derive(Debug, Deserialize)]
struct FlowAnswer {
    #[serde(default)]
    nodes: Vec<FlowNode>,
    #[serde(default)]
    edges: Vec<FlowEdge>,
}

#[derive(Debug, Deserialize)]
struct FlowNode {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default, rename = "type", alias = "kind")]
    kind: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FlowEdge {
    #[serde(alias = "from")]
    source: String,
    #[serde(alias = "to")]
    target: String,
    #[serde(default)]
    label: Option<String>,
}

/// Asks the model for the process flow of `files`, drilled from `scope`.
///
/// Node ids are namespaced under `scope`. Process steps keep only the files
/// that belong to the request so they can be drilled further.
///
/// # Errors
///
/// Returns [`EngineError::Collaborator`] when the call fails or the answer
/// cannot be parsed, and [`EngineError::TrivialResult`] when fewer than two
/// nodes survive.
pub async fn infer_process_flow(
    llm: &dyn LlmClient,
    config: &EngineConfig,
    scope: &NodeId,
    label: &str,
    files: &[String],
) -> Result<Graph> {
    let request = CompletionRequest {
        model: config.model.clone(),
        prompt: build_prompt(label, files),
        max_tokens: config.max_tokens,
    };
    let response = llm.complete(&request).await.map_err(|e| EngineError::Collaborator {
        collaborator: COLLABORATOR,
        message: e.to_string(),
    })?;
    parse_flow(&response.text, scope, files)
}

fn build_prompt(label: &str, files: &[String]) -> String {
    let mut prompt = format!(
        "Describe the main process flow implemented by the \"{label}\" subsystem as a \
         flow chart of 3 to 10 steps.\n\nFiles:\n"
    );
    for file in files {
        prompt.push_str(&format!("- {file}\n"));
    }
    prompt.push_str(
        "\nRespond with JSON only: {\"nodes\": [{\"id\": \"...\", \"label\": \"...\", \
         \"type\": \"start|process|decision|end|database|system\", \"description\": \"...\", \
         \"files\": [\"<file path>\"]}], \"edges\": [{\"source\": \"...\", \"target\": \"...\", \
         \"label\": \"...\"}]}",
    );
    prompt
}

/// Parses and sanitizes a flow answer.
fn parse_flow(text: &str, scope: &NodeId, files: &[String]) -> Result<Graph> {
    let json = extract_json(text).ok_or_else(|| EngineError::Collaborator {
        collaborator: COLLABORATOR,
        message: "answer contains no JSON object".into(),
    })?;
    let answer: FlowAnswer = serde_json::from_str(json).map_err(|e| EngineError::Collaborator {
        collaborator: COLLABORATOR,
        message: format!("failed to parse flow answer: {e}"),
    })?;

    let known: BTreeSet<&str> = files.iter().map(String::as_str).collect();
    let mut seen = BTreeSet::new();
    let mut nodes = Vec::new();
    for node in answer.nodes {
        if node.id.trim().is_empty() || !seen.insert(node.id.clone()) {
            continue;
        }
        let kind = node.kind.as_deref().map_or(NodeKind::Process, NodeKind::from_flow_name);
        let node_files: Vec<String> =
            node.files.into_iter().filter(|f| known.contains(f.as_str())).collect();
        let mut graph_node = GraphNode::new(
            NodeId::scoped(scope, &node.id),
            node.label.unwrap_or_else(|| node.id.clone()),
            kind,
        )
        .with_files(node_files);
        if let Some(description) = node.description.filter(|d| !d.trim().is_empty()) {
            graph_node = graph_node.with_attribute("description", description);
        }
        nodes.push(graph_node);
    }

    if nodes.len() < 2 {
        return Err(EngineError::TrivialResult { collaborator: COLLABORATOR, nodes: nodes.len() });
    }

    let mut edges: BTreeMap<(String, String), Edge> = BTreeMap::new();
    for edge in answer.edges {
        if edge.source == edge.target || !seen.contains(&edge.source) || !seen.contains(&edge.target)
        {
            continue;
        }
        edges
            .entry((edge.source.clone(), edge.target.clone()))
            .and_modify(|e| e.weight += 1)
            .or_insert_with(|| {
                Edge::new(NodeId::scoped(scope, &edge.source), NodeId::scoped(scope, &edge.target))
                    .with_label(edge.label.filter(|l| !l.trim().is_empty()))
            });
    }

    Ok(Graph::new(nodes, edges.into_values().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> NodeId {
        NodeId::for_group("Billing")
    }

    fn files() -> Vec<String> {
        vec!["src/billing/invoice.ts".into(), "src/billing/tax.ts".into()]
    }

    #[test]
    fn prompt_names_the_subsystem_and_lists_its_files() {
        let prompt = build_prompt("Billing", &files());
        assert!(prompt.starts_with("Describe the main process flow implemented by the \"Billing\" subsystem"));
        assert!(prompt.contains("Files:\n- src/billing/invoice.ts\n- src/billing/tax.ts\n"));
    }

    #[test]
    fn parses_nodes_and_edges_under_the_scope() {
        let text = r#"{"nodes": [
            {"id": "s", "label": "Order placed", "type": "start"},
            {"id": "calc", "label": "Compute tax", "type": "process",
             "files": ["src/billing/tax.ts", "src/unrelated.ts"]},
            {"id": "ok", "label": "Valid?", "type": "decision"},
            {"id": "e", "label": "Invoice sent", "type": "end"}
        ], "edges": [
            {"source": "s", "target": "calc"},
            {"source": "calc", "target": "ok", "label": "done"},
            {"source": "ok", "target": "e", "label": "yes"},
            {"source": "ok", "target": "ghost"},
            {"source": "e", "target": "e"}
        ]}"#;

        let graph = parse_flow(text, &scope(), &files()).unwrap();

        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.edges.len(), 3);
        let calc = graph.node(&NodeId::scoped(&scope(), "calc")).unwrap();
        assert_eq!(calc.kind, NodeKind::Process);
        assert_eq!(calc.source_files, vec!["src/billing/tax.ts".to_string()]);
        assert_eq!(graph.nodes[2].kind, NodeKind::Decision);
    }

    #[test]
    fn single_node_answers_are_trivial() {
        let text = r#"{"nodes": [{"id": "only"}], "edges": []}"#;
        let err = parse_flow(text, &scope(), &files()).unwrap_err();
        assert!(matches!(err, EngineError::TrivialResult { nodes: 1, .. }));
    }

    #[test]
    fn garbage_is_a_collaborator_error() {
        let err = parse_flow("I cannot help with that.", &scope(), &files()).unwrap_err();
        assert!(matches!(err, EngineError::Collaborator { .. }));
    }

    #[test]
    fn duplicate_ids_are_dropped() {
        let text = r#"{"nodes": [{"id": "a"}, {"id": "a"}, {"id": "b", "kind": "end"}]}"#;
        let graph = parse_flow(text, &scope(), &files()).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[1].kind, NodeKind::End);
    }
}
