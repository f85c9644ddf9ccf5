//! `archscope layout` command.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use super::Workspace;
use crate::assemble::Granularity;
use crate::drill::cache::EntityCache;
use crate::graph::NodeId;
use crate::layout::layout;
use crate::workspace::{overview, OverviewOptions};

/// Execute the `layout` command.
///
/// Lays out the overview at `granularity` with the `expand` containers open.
///
/// # Errors
///
/// Returns an error string if the project files cannot be listed or an
/// expanded id names no node of the overview.
pub async fn run(workspace: &Workspace<'_>, granularity: Granularity, expand: &[String]) -> Result<Value, String> {
    let cache = EntityCache::default();
    let options = OverviewOptions { granularity, root_label: None };
    let overview = overview(workspace.ctx, &cache, workspace.root, workspace.config, &options)
        .await
        .map_err(|e| e.to_string())?;
    let graph = &overview.assembly.graph;

    let mut expanded = BTreeSet::new();
    for raw in expand {
        let id = NodeId::new(raw.as_str());
        if graph.node(&id).is_none() {
            return Err(format!("unknown node {id}"));
        }
        expanded.insert(id);
    }

    let laid_out = layout(&graph.nodes, &graph.edges, &expanded, &workspace.config.spacing);
    Ok(json!({ "granularity": granularity, "layout": laid_out }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::Project;

    fn visible(value: &Value) -> Vec<String> {
        value["layout"]["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|n| n["visible"] == true)
            .map(|n| n["id"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn collapsed_overview_shows_only_groups() {
        let project = Project::new("layout_collapsed");
        let value = run(&project.workspace(), Granularity::Full, &[]).await.unwrap();
        let mut shown = visible(&value);
        shown.sort();
        assert_eq!(shown, vec!["group:Data Access", "group:Presentation"]);
    }

    #[tokio::test]
    async fn expanding_a_group_reveals_its_files() {
        let project = Project::new("layout_expanded");
        let expand = vec!["group:Presentation".to_string()];
        let value = run(&project.workspace(), Granularity::Full, &expand).await.unwrap();
        let shown = visible(&value);
        assert!(shown.contains(&"file:src/ui/view.rs".to_string()), "{shown:?}");
        assert!(!shown.contains(&"file:src/db/store.rs".to_string()), "{shown:?}");
    }

    #[tokio::test]
    async fn unknown_expansions_are_rejected() {
        let project = Project::new("layout_unknown");
        let err = run(&project.workspace(), Granularity::Full, &["nope".to_string()]).await.unwrap_err();
        assert!(err.contains("unknown node nope"));
    }
}
