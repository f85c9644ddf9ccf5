//! Ranked strategies producing the view behind a drilled node.
//!
//! A [`FallbackChain`] tries its strategies in order; the first one that
//! returns a graph wins. Recoverable failures move on to the next tier.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use super::cache::EntityCache;
use super::heuristic::heuristic_flow;
use super::DrillRequest;
use crate::assemble::{assemble, AssembleOptions, Granularity};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::{Graph, NodeKind};
use crate::inference::flow::infer_process_flow;
use crate::ports::{CallProvider, EntityProvider, LlmClient};

/// Collaborators available while resolving a drill request.
#[derive(Clone, Copy)]
pub struct DrillContext<'a> {
    /// Entity discovery.
    pub entities: &'a dyn EntityProvider,
    /// Relationship discovery.
    pub calls: &'a dyn CallProvider,
    /// Inference; `None` when no model is configured.
    pub llm: Option<&'a dyn LlmClient>,
    /// Engine settings.
    pub config: &'a EngineConfig,
    /// File → entity cache of the owning orchestrator.
    pub cache: &'a EntityCache,
}

/// Boxed future returned by [`ViewStrategy::build`].
pub type StrategyFuture<'a> = Pin<Box<dyn Future<Output = Result<Graph>> + Send + 'a>>;

/// One tier of a fallback chain.
pub trait ViewStrategy: Send + Sync {
    /// Short name used in logs and notices.
    fn name(&self) -> &'static str;

    /// Produces the view for `request`.
    ///
    /// # Errors
    ///
    /// Returns a recoverable [`EngineError`] when this tier cannot produce a
    /// useful view, letting the chain move on.
    fn build<'a>(&'a self, ctx: DrillContext<'a>, request: &'a DrillRequest) -> StrategyFuture<'a>;
}

/// Asks the inference collaborator for a process flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferredFlow;

impl ViewStrategy for InferredFlow {
    fn name(&self) -> &'static str {
        "inferred process flow"
    }

    fn build<'a>(&'a self, ctx: DrillContext<'a>, request: &'a DrillRequest) -> StrategyFuture<'a> {
        Box::pin(async move {
            let llm = ctx.llm.ok_or_else(|| EngineError::Collaborator {
                collaborator: "process-flow",
                message: "no inference collaborator configured".into(),
            })?;
            infer_process_flow(llm, ctx.config, &request.target, &request.label, &request.source_files)
                .await
        })
    }
}

/// A linear flow with one step per file.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicFlow;

impl ViewStrategy for HeuristicFlow {
    fn name(&self) -> &'static str {
        "heuristic process flow"
    }

    fn build<'a>(&'a self, ctx: DrillContext<'a>, request: &'a DrillRequest) -> StrategyFuture<'a> {
        Box::pin(async move {
            heuristic_flow(&request.target, &request.label, &request.source_files, ctx.config.flow_step_cap)
                .ok_or(EngineError::TrivialResult { collaborator: "heuristic-flow", nodes: 0 })
        })
    }
}

/// The flattened component graph of the node's files under a root labelled
/// like the node.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentGraph;

impl ViewStrategy for ComponentGraph {
    fn name(&self) -> &'static str {
        "component graph"
    }

    fn build<'a>(&'a self, ctx: DrillContext<'a>, request: &'a DrillRequest) -> StrategyFuture<'a> {
        Box::pin(async move {
            let files = ctx.cache.load_all(ctx.entities, &request.source_files).await;
            let options = AssembleOptions {
                granularity: Granularity::Flattened,
                virtual_root_label: Some(&request.label),
                default_group: &ctx.config.default_group,
                ..AssembleOptions::default()
            };
            let assembly = assemble(ctx.calls, &files, &options).await;
            Ok(assembly.graph)
        })
    }
}

/// The graph chosen by a chain and how it was chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The produced view.
    pub graph: Graph,
    /// Name of the winning strategy.
    pub strategy: &'static str,
    /// Set when a lower tier than the first produced the view.
    pub notice: Option<String>,
}

/// Ordered list of strategies; first success wins.
pub struct FallbackChain {
    strategies: Vec<Box<dyn ViewStrategy>>,
}

impl FallbackChain {
    /// Creates a chain from ranked strategies.
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn ViewStrategy>>) -> Self {
        Self { strategies }
    }

    /// The default chain for drilling into a node of `kind`.
    ///
    /// Systems get a process flow, inferred or heuristic, and finally the
    /// component graph. Processes go straight to the component graph.
    #[must_use]
    pub fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::System => Self::new(vec![
                Box::new(InferredFlow),
                Box::new(HeuristicFlow),
                Box::new(ComponentGraph),
            ]),
            _ => Self::new(vec![Box::new(ComponentGraph)]),
        }
    }

    /// Names of the strategies, highest tier first.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.iter().map(|s| s.name())
    }

    /// Runs the chain for `request`.
    ///
    /// # Errors
    ///
    /// Returns the first non-recoverable error, or [`EngineError::Exhausted`]
    /// when every tier failed.
    pub async fn run(&self, ctx: DrillContext<'_>, request: &DrillRequest) -> Result<Resolution> {
        let mut first_failure: Option<String> = None;
        let mut last_failure = String::from("no strategies configured");

        for (tier, strategy) in self.strategies.iter().enumerate() {
            match strategy.build(ctx, request).await {
                Ok(graph) => {
                    debug!(
                        target_node = %request.target,
                        strategy = strategy.name(),
                        tier,
                        "drill view resolved"
                    );
                    let notice = first_failure.map(|reason| {
                        format!("{}: showing {} ({reason})", request.label, strategy.name())
                    });
                    return Ok(Resolution { graph, strategy: strategy.name(), notice });
                }
                Err(e) if e.is_recoverable() => {
                    warn!(
                        target_node = %request.target,
                        strategy = strategy.name(),
                        error = %e,
                        "drill strategy failed, falling back"
                    );
                    if first_failure.is_none() {
                        first_failure = Some(e.to_string());
                    }
                    last_failure = e.to_string();
                }
                Err(e) => return Err(e),
            }
        }

        Err(EngineError::Exhausted { target: request.target.clone(), last: last_failure })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::tests::StaticCalls;
    use crate::drill::tests::StaticEntities;
    use crate::drill::DrillToken;
    use crate::graph::NodeId;

    struct Failing(fn() -> EngineError);

    impl ViewStrategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn build<'a>(&'a self, _ctx: DrillContext<'a>, _request: &'a DrillRequest) -> StrategyFuture<'a> {
            let error = (self.0)();
            Box::pin(async move { Err(error) })
        }
    }

    struct Fixed;

    impl ViewStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn build<'a>(&'a self, _ctx: DrillContext<'a>, _request: &'a DrillRequest) -> StrategyFuture<'a> {
            Box::pin(async { Ok(Graph::default()) })
        }
    }

    fn request() -> DrillRequest {
        DrillRequest {
            token: DrillToken(1),
            target: NodeId::for_group("Billing"),
            label: "Billing".into(),
            kind: NodeKind::System,
            source_files: vec!["src/billing.rs".into()],
            level: 1,
        }
    }

    struct Fixture {
        calls: StaticCalls,
        entities: StaticEntities,
        config: EngineConfig,
        cache: EntityCache,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                calls: StaticCalls::default(),
                entities: StaticEntities::default(),
                config: EngineConfig::default(),
                cache: EntityCache::default(),
            }
        }

        fn ctx(&self) -> DrillContext<'_> {
            DrillContext {
                entities: &self.entities,
                calls: &self.calls,
                llm: None,
                config: &self.config,
                cache: &self.cache,
            }
        }
    }

    #[tokio::test]
    async fn lower_tiers_win_after_recoverable_failures_and_leave_a_notice() {
        let chain = FallbackChain::new(vec![
            Box::new(Failing(|| EngineError::TrivialResult { collaborator: "flow", nodes: 1 })),
            Box::new(Fixed),
        ]);
        let fixture = Fixture::new();

        let resolution = chain.run(fixture.ctx(), &request()).await.unwrap();

        assert_eq!(resolution.strategy, "fixed");
        assert!(resolution.notice.unwrap().contains("trivial result"));
    }

    #[tokio::test]
    async fn non_recoverable_failures_stop_the_chain() {
        let chain = FallbackChain::new(vec![
            Box::new(Failing(|| EngineError::Config("broken".into()))),
            Box::new(Fixed),
        ]);
        let fixture = Fixture::new();

        let result = chain.run(fixture.ctx(), &request()).await;

        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[tokio::test]
    async fn exhausted_chains_report_the_last_failure() {
        let chain = FallbackChain::new(vec![Box::new(Failing(|| EngineError::Collaborator {
            collaborator: "flow",
            message: "timeout".into(),
        }))]);
        let fixture = Fixture::new();

        let result = chain.run(fixture.ctx(), &request()).await;

        assert!(matches!(result, Err(EngineError::Exhausted { last, .. }) if last.contains("timeout")));
    }

    #[tokio::test]
    async fn system_chain_without_a_model_uses_the_heuristic_flow() {
        let chain = FallbackChain::for_kind(NodeKind::System);
        assert_eq!(
            chain.names().collect::<Vec<_>>(),
            vec!["inferred process flow", "heuristic process flow", "component graph"]
        );
        let fixture = Fixture::new();

        let resolution = chain.run(fixture.ctx(), &request()).await.unwrap();

        assert_eq!(resolution.strategy, "heuristic process flow");
        assert_eq!(resolution.graph.nodes.len(), 3);
        assert!(resolution.notice.is_some());
    }

    #[test]
    fn processes_go_straight_to_the_component_graph() {
        let chain = FallbackChain::for_kind(NodeKind::Process);
        assert_eq!(chain.names().collect::<Vec<_>>(), vec!["component graph"]);
    }
}
