//! `archscope graph` command.

use serde_json::{json, Value};

use super::Workspace;
use crate::assemble::Granularity;
use crate::drill::cache::EntityCache;
use crate::workspace::{overview, OverviewOptions};

/// Execute the `graph` command.
///
/// Assembles the overview at `granularity` and returns it with the grouping
/// source and aggregation counters.
///
/// # Errors
///
/// Returns an error string if the project files cannot be listed.
pub async fn run(
    workspace: &Workspace<'_>,
    granularity: Granularity,
    root_label: Option<&str>,
) -> Result<Value, String> {
    let cache = EntityCache::default();
    let options = OverviewOptions { granularity, root_label };
    let overview = overview(workspace.ctx, &cache, workspace.root, workspace.config, &options)
        .await
        .map_err(|e| e.to_string())?;

    Ok(json!({
        "granularity": granularity,
        "grouping": overview.grouping,
        "files": overview.files,
        "stats": overview.assembly.stats,
        "graph": overview.assembly.graph,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::Project;

    #[tokio::test]
    async fn full_graph_lists_types_and_the_edge_between_them() {
        let project = Project::new("graph_full");
        let value = run(&project.workspace(), Granularity::Full, None).await.unwrap();

        assert_eq!(value["granularity"], "full");
        assert_eq!(value["grouping"], "heuristic");
        let labels: Vec<&str> =
            value["graph"]["nodes"].as_array().unwrap().iter().map(|n| n["label"].as_str().unwrap()).collect();
        assert!(labels.contains(&"Store"), "{labels:?}");
        assert!(labels.contains(&"render"), "{labels:?}");
        let edges = value["graph"]["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0]["weight"], 1);
        assert_eq!(value["stats"]["counted"], 1);
    }

    #[tokio::test]
    async fn root_label_adopts_every_group() {
        let project = Project::new("graph_root");
        let value = run(&project.workspace(), Granularity::Process, Some("App")).await.unwrap();

        let nodes = value["graph"]["nodes"].as_array().unwrap();
        let root = nodes.iter().find(|n| n["label"] == "App").unwrap();
        let systems: Vec<&Value> = nodes.iter().filter(|n| n["kind"] == "system").collect();
        assert_eq!(systems.len(), 2);
        assert!(systems.iter().all(|s| s["parent_id"] == root["id"]));
    }
}
