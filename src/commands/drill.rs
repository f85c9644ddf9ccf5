//! `archscope drill` command.

use serde_json::{json, Value};
use tracing::info;

use super::Workspace;
use crate::assemble::Granularity;
use crate::drill::cache::EntityCache;
use crate::drill::{ApplyOutcome, Orchestrator};
use crate::graph::NodeId;
use crate::workspace::{overview, Overview, OverviewOptions};

/// Execute the `drill` command.
///
/// Starts from the process-level overview and drills through `path` one node
/// at a time, returning the breadcrumbs, the strategy behind every step and
/// the final frame.
///
/// # Errors
///
/// Returns an error string if the overview cannot be built, a node of `path`
/// cannot be drilled into, or every strategy for a step failed.
pub async fn run(workspace: &Workspace<'_>, path: &[String]) -> Result<Value, String> {
    let cache = EntityCache::default();
    let options = OverviewOptions { granularity: Granularity::Process, root_label: None };
    let overview = overview(workspace.ctx, &cache, workspace.root, workspace.config, &options)
        .await
        .map_err(|e| e.to_string())?;

    let mut orchestrator =
        Orchestrator::new(overview.assembly.graph, Overview::label(&options)).with_cache(cache);
    let mut steps = Vec::with_capacity(path.len());

    for raw in path {
        let id = NodeId::new(raw.as_str());
        let outcome = orchestrator
            .drill(
                workspace.ctx.entities.as_ref(),
                workspace.ctx.calls.as_ref(),
                workspace.ctx.llm(),
                workspace.config,
                &id,
            )
            .await
            .map_err(|e| e.to_string())?;

        match outcome {
            ApplyOutcome::Applied { strategy, notice } => {
                if let Some(notice) = &notice {
                    info!(%notice, "degraded drill view");
                }
                steps.push(json!({ "node": id, "strategy": strategy, "notice": notice }));
            }
            ApplyOutcome::Failed(e) => return Err(e.to_string()),
            ApplyOutcome::Discarded => return Err(format!("drill into {id} was superseded")),
        }
    }

    Ok(json!({
        "breadcrumbs": orchestrator.breadcrumbs(),
        "steps": steps,
        "graph": orchestrator.graph(),
    }))
}
