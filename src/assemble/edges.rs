//! Call edge aggregation: lifts entity-level calls onto owner-level edges.

use std::collections::BTreeMap;

use futures::future::join_all;
use serde::Serialize;
use tracing::debug;

use super::owner::OwnerMap;
use crate::entity::index::LocationIndex;
use crate::entity::{CallTarget, CallableEntity};
use crate::graph::{Edge, NodeId};
use crate::ports::CallProvider;

/// Counters describing one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregationStats {
    /// Callables queried for outgoing calls.
    pub queried: usize,
    /// Queries that failed and were treated as empty.
    pub failed: usize,
    /// Calls whose target lies outside the analyzed files.
    pub unresolved: usize,
    /// Calls between two entities with the same owner.
    pub internal: usize,
    /// Calls that contributed to an edge.
    pub counted: usize,
}

/// Accumulates calls into at most one edge per ordered owner pair.
///
/// Accumulation is commutative, so query completion order never matters.
#[derive(Debug, Default)]
pub struct EdgeAccumulator {
    edges: BTreeMap<(NodeId, NodeId), Edge>,
}

impl EdgeAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one call from `source` to `target`.
    ///
    /// Returns `false` and records nothing for self-loops.
    pub fn record(&mut self, source: &NodeId, target: &NodeId, description: &str) -> bool {
        if source == target {
            return false;
        }
        let edge = self
            .edges
            .entry((source.clone(), target.clone()))
            .or_insert_with(|| Edge { weight: 0, ..Edge::new(source.clone(), target.clone()) });
        edge.weight += 1;
        if !edge.detail.iter().any(|d| d == description) {
            edge.detail.push(description.to_string());
        }
        true
    }

    /// Number of distinct edges so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether no edge was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Finalizes the edge set.
    #[must_use]
    pub fn finish(self) -> Vec<Edge> {
        self.edges.into_values().collect()
    }
}

/// Human-readable description of one call.
fn describe(caller: &CallableEntity, target: &CallTarget) -> String {
    format!("{}() -> {}()", caller.name, target.target_name)
}

/// Queries the outgoing calls of every callable concurrently and folds them
/// into owner-level edges once all queries have settled.
///
/// Only callable entities are queried. Failed queries count as "no calls";
/// targets outside the batch are ignored.
pub async fn aggregate(
    calls: &dyn CallProvider,
    callables: &[CallableEntity],
    index: &LocationIndex,
    owners: &OwnerMap,
) -> (Vec<Edge>, AggregationStats) {
    let results = join_all(callables.iter().map(|c| calls.outgoing_calls(c))).await;

    let mut stats = AggregationStats { queried: callables.len(), ..AggregationStats::default() };
    let mut acc = EdgeAccumulator::new();

    for (caller, result) in callables.iter().zip(results) {
        let targets = match result {
            Ok(targets) => targets,
            Err(e) => {
                debug!(entity = %caller.id, error = %e, "call query failed, treating as empty");
                stats.failed += 1;
                continue;
            }
        };
        let Some(source) = owners.owner_of(&caller.id) else {
            continue;
        };
        for target in &targets {
            let Some(callee) = index.resolve(&target.target_file, target.target_start_line) else {
                stats.unresolved += 1;
                continue;
            };
            let Some(sink) = owners.owner_of(callee) else {
                stats.unresolved += 1;
                continue;
            };
            if acc.record(source, sink, &describe(caller, target)) {
                stats.counted += 1;
            } else {
                stats.internal += 1;
            }
        }
    }

    debug!(
        queried = stats.queried,
        failed = stats.failed,
        unresolved = stats.unresolved,
        internal = stats.internal,
        edges = acc.len(),
        "aggregated call edges"
    );
    (acc.finish(), stats)
}
