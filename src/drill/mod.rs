//! Drill-down orchestration.
//!
//! The [`Orchestrator`] owns the displayed frame, the navigation stack, the
//! expansion state and the entity cache. A drill goes through three steps so
//! the race between overlapping requests stays explicit:
//!
//! 1. [`Orchestrator::begin_drill`] issues a [`DrillRequest`] whose token
//!    becomes the only active one;
//! 2. [`resolve`] runs the fallback chain without touching orchestrator state;
//! 3. [`Orchestrator::apply`] publishes the response only if its token is
//!    still the active one.

pub mod cache;
pub mod fallback;
pub mod heuristic;
pub mod navigation;
pub mod preview;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::{Graph, NodeId, NodeKind};
use crate::ports::{CallProvider, EntityProvider, LlmClient};
use cache::{EntityCache, ScanMode};
use fallback::{DrillContext, FallbackChain};
use navigation::{ExpansionState, NavigationStack, ViewFrame};

/// Identifies one drill request; later requests carry larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DrillToken(pub u64);

impl fmt::Display for DrillToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request for the view behind one node.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillRequest {
    /// Token the response must carry to be applied.
    pub token: DrillToken,
    /// The drilled node.
    pub target: NodeId,
    /// Label of the drilled node, used for the new frame.
    pub label: String,
    /// Kind of the drilled node; selects the fallback chain.
    pub kind: NodeKind,
    /// Files behind the drilled node.
    pub source_files: Vec<String>,
    /// Depth of the frame the response will create.
    pub level: usize,
}

/// The outcome of resolving a [`DrillRequest`].
#[derive(Debug)]
pub struct DrillResponse {
    /// Token of the originating request.
    pub token: DrillToken,
    /// Label for the new frame.
    pub label: String,
    /// The resolved view, or why none could be produced.
    pub result: Result<fallback::Resolution>,
}

/// What [`Orchestrator::apply`] did with a response.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// The response became the displayed frame.
    Applied {
        /// Winning strategy.
        strategy: &'static str,
        /// Informational message when a lower-fidelity view was used.
        notice: Option<String>,
    },
    /// The response was superseded and dropped.
    Discarded,
    /// Every strategy failed; the displayed frame is unchanged.
    Failed(EngineError),
}

/// What a background refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The top-level graph was replaced.
    Applied,
    /// A drill is pending or a drilled frame is displayed.
    Suppressed,
}

/// A `jumpTo` request for a leaf node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JumpTarget {
    /// File to open.
    pub file: String,
    /// Zero-based line to reveal.
    pub line: u32,
}

/// What activating a node asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// Resolve and apply this request.
    Drill(DrillRequest),
    /// Reveal a source location.
    Jump(JumpTarget),
    /// A container was expanded (`true`) or collapsed.
    Toggled(bool),
    /// The node has nothing behind it.
    Inert,
}

/// Owns the drill-down state of one diagram.
#[derive(Debug)]
pub struct Orchestrator {
    current: ViewFrame,
    stack: NavigationStack,
    expansion: ExpansionState,
    active: Option<DrillToken>,
    last_token: u64,
    cache: EntityCache,
    scan_mode: Arc<ScanMode>,
}

impl Orchestrator {
    /// Starts at the top-level `graph`.
    pub fn new(graph: Graph, label: impl Into<String>) -> Self {
        Self {
            current: ViewFrame::new(graph, label),
            stack: NavigationStack::default(),
            expansion: ExpansionState::default(),
            active: None,
            last_token: 0,
            cache: EntityCache::default(),
            scan_mode: Arc::new(ScanMode::default()),
        }
    }

    /// Reuses an entity cache already filled while building the overview.
    #[must_use]
    pub fn with_cache(mut self, cache: EntityCache) -> Self {
        self.cache = cache;
        self
    }

    /// The displayed graph.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.current.graph
    }

    /// The displayed frame.
    #[must_use]
    pub fn frame(&self) -> &ViewFrame {
        &self.current
    }

    /// Number of frames above the displayed one.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Labels from the top level down to the displayed frame.
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<&str> {
        self.stack.labels().chain(std::iter::once(self.current.label.as_str())).collect()
    }

    /// The token a response must carry to be applied.
    #[must_use]
    pub fn active_token(&self) -> Option<DrillToken> {
        self.active
    }

    /// Expanded containers of the displayed frame.
    #[must_use]
    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Expands or collapses a container; returns whether it is now expanded.
    pub fn toggle_expanded(&mut self, id: &NodeId) -> bool {
        self.expansion.toggle(id)
    }

    /// Expands a container.
    pub fn expand(&mut self, id: NodeId) {
        self.expansion.expand(id);
    }

    /// The entity cache shared by every drill of this diagram.
    #[must_use]
    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// The background-scan flag, to hand to [`cache::warm`].
    #[must_use]
    pub fn scan_mode(&self) -> Arc<ScanMode> {
        Arc::clone(&self.scan_mode)
    }

    /// Switches background scanning; switching it off drops the cache.
    pub fn set_scan_mode(&mut self, on: bool) {
        self.scan_mode.set(on);
        if !on {
            self.cache.clear();
            debug!("scan mode off, entity cache cleared");
        }
    }

    /// Builds the collaborator bundle for [`resolve`] around this
    /// orchestrator's cache.
    #[must_use]
    pub fn context<'a>(
        &'a self,
        entities: &'a dyn EntityProvider,
        calls: &'a dyn CallProvider,
        llm: Option<&'a dyn LlmClient>,
        config: &'a EngineConfig,
    ) -> DrillContext<'a> {
        DrillContext { entities, calls, llm, config, cache: &self.cache }
    }

    /// Issues a request for the view behind `id`, superseding any pending one.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownNode`] when `id` is not displayed and
    /// [`EngineError::NotDrillable`] unless it is a system or process node
    /// with source files.
    pub fn begin_drill(&mut self, id: &NodeId) -> Result<DrillRequest> {
        let node = self.current.graph.node(id).ok_or_else(|| EngineError::UnknownNode(id.clone()))?;
        if !node.kind.is_drillable() || node.source_files.is_empty() {
            return Err(EngineError::NotDrillable(id.clone()));
        }

        self.last_token += 1;
        let token = DrillToken(self.last_token);
        if let Some(previous) = self.active.replace(token) {
            debug!(%previous, %token, "pending drill superseded");
        }
        let request = DrillRequest {
            token,
            target: node.id.clone(),
            label: node.label.clone(),
            kind: node.kind,
            source_files: node.source_files.clone(),
            level: self.stack.depth() + 1,
        };
        debug!(%token, target_node = %request.target, kind = ?request.kind, "drill requested");
        Ok(request)
    }

    /// Publishes `response` if it answers the active request.
    pub fn apply(&mut self, response: DrillResponse) -> ApplyOutcome {
        if self.active != Some(response.token) {
            debug!(token = %response.token, active = ?self.active, "stale drill response discarded");
            return ApplyOutcome::Discarded;
        }
        self.active = None;

        match response.result {
            Ok(resolution) => {
                let next = ViewFrame::new(resolution.graph, response.label);
                let previous = std::mem::replace(&mut self.current, next);
                self.stack.push(previous);
                self.expansion.clear();
                info!(
                    label = %self.current.label,
                    strategy = resolution.strategy,
                    depth = self.stack.depth(),
                    "drilled down"
                );
                ApplyOutcome::Applied { strategy: resolution.strategy, notice: resolution.notice }
            }
            Err(e) => {
                warn!(error = %e, "drill produced no view");
                ApplyOutcome::Failed(e)
            }
        }
    }

    /// Issues, resolves and applies a drill into `id`.
    ///
    /// # Errors
    ///
    /// Returns the [`begin_drill`](Self::begin_drill) errors.
    pub async fn drill(
        &mut self,
        entities: &dyn EntityProvider,
        calls: &dyn CallProvider,
        llm: Option<&dyn LlmClient>,
        config: &EngineConfig,
        id: &NodeId,
    ) -> Result<ApplyOutcome> {
        let request = self.begin_drill(id)?;
        let response = resolve(self.context(entities, calls, llm, config), &request).await;
        Ok(self.apply(response))
    }

    /// Returns to the previous frame, restoring it verbatim.
    ///
    /// Drops interest in any pending request and collapses everything.
    /// Returns `false` at the top level.
    pub fn back(&mut self) -> bool {
        let Some(previous) = self.stack.pop() else {
            return false;
        };
        self.current = previous;
        if let Some(token) = self.active.take() {
            debug!(%token, "pending drill abandoned by navigation");
        }
        self.expansion.clear();
        info!(label = %self.current.label, depth = self.stack.depth(), "navigated back");
        true
    }

    /// Offers a recomputed top-level graph from a background refresh.
    ///
    /// Refused while a drill is pending or a drilled frame is displayed.
    /// The expansion state survives an applied refresh.
    pub fn offer_refresh(&mut self, graph: Graph) -> RefreshOutcome {
        if self.active.is_some() || !self.stack.is_empty() {
            debug!(
                depth = self.stack.depth(),
                pending = self.active.is_some(),
                "background refresh suppressed"
            );
            return RefreshOutcome::Suppressed;
        }
        self.current.graph = graph;
        RefreshOutcome::Applied
    }

    /// Handles a double-activation of `id`.
    ///
    /// Drillable nodes issue a request, containers toggle, and leaves with a
    /// source location ask to jump there.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownNode`] when `id` is not displayed.
    pub fn activate(&mut self, id: &NodeId) -> Result<Activation> {
        let node = self.current.graph.node(id).ok_or_else(|| EngineError::UnknownNode(id.clone()))?;
        if node.kind.is_drillable() && !node.source_files.is_empty() {
            return self.begin_drill(id).map(Activation::Drill);
        }
        if self.current.graph.has_children(id) {
            return Ok(Activation::Toggled(self.expansion.toggle(id)));
        }
        Ok(node.location.as_ref().map_or(Activation::Inert, |loc| {
            Activation::Jump(JumpTarget { file: loc.file.clone(), line: loc.start_line })
        }))
    }
}

/// Runs the fallback chain for `request`'s node kind.
pub async fn resolve(ctx: DrillContext<'_>, request: &DrillRequest) -> DrillResponse {
    let chain = FallbackChain::for_kind(request.kind);
    DrillResponse {
        token: request.token,
        label: request.label.clone(),
        result: chain.run(ctx, request).await,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::assemble::tests::{sample_files, StaticCalls};
    use crate::entity::Entity;
    use crate::graph::{Edge, GraphNode, SourceLocation};
    use crate::ports::{PortError, PortFuture};

    /// Entity provider answering from a fixed table keyed by path.
    #[derive(Default)]
    pub(crate) struct StaticEntities {
        pub(crate) files: HashMap<String, Vec<Entity>>,
    }

    impl StaticEntities {
        pub(crate) fn from_samples() -> Self {
            Self { files: sample_files().into_iter().map(|f| (f.path, f.entities)).collect() }
        }
    }

    impl EntityProvider for StaticEntities {
        fn entities(&self, path: &str) -> PortFuture<'_, Vec<Entity>> {
            let result: std::result::Result<Vec<Entity>, PortError> = self
                .files
                .get(path)
                .cloned()
                .ok_or_else(|| format!("no such file: {path}").into());
            Box::pin(async move { result })
        }
    }

    fn overview() -> Graph {
        let system = |name: &str, files: &[&str]| {
            GraphNode::new(NodeId::for_group(name), name, NodeKind::System)
                .with_files(files.iter().map(|f| (*f).to_string()).collect())
        };
        Graph::new(
            vec![
                system("Presentation", &["src/ui/view.ts"]),
                system("Data Access", &["src/data/repo.ts"]),
                GraphNode::new(NodeId::for_group("Empty"), "Empty", NodeKind::System),
            ],
            vec![Edge::new(NodeId::for_group("Presentation"), NodeId::for_group("Data Access"))],
        )
    }

    struct Fixture {
        entities: StaticEntities,
        calls: StaticCalls,
        config: EngineConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                entities: StaticEntities::from_samples(),
                calls: StaticCalls::default(),
                config: EngineConfig::default(),
            }
        }
    }

    #[test]
    fn only_drillable_nodes_with_files_issue_requests() {
        let mut orchestrator = Orchestrator::new(overview(), "System");

        let err = orchestrator.begin_drill(&NodeId::for_group("Empty")).unwrap_err();
        assert!(matches!(err, EngineError::NotDrillable(_)));
        let err = orchestrator.begin_drill(&NodeId::from("ghost")).unwrap_err();
        assert!(matches!(err, EngineError::UnknownNode(_)));
        assert!(orchestrator.active_token().is_none());

        let request = orchestrator.begin_drill(&NodeId::for_group("Presentation")).unwrap();
        assert_eq!(request.token, DrillToken(1));
        assert_eq!(request.level, 1);
        assert_eq!(orchestrator.active_token(), Some(DrillToken(1)));
    }

    #[tokio::test]
    async fn superseded_responses_are_discarded() {
        let fixture = Fixture::new();
        let mut orchestrator = Orchestrator::new(overview(), "System");

        let first = orchestrator.begin_drill(&NodeId::for_group("Presentation")).unwrap();
        let second = orchestrator.begin_drill(&NodeId::for_group("Data Access")).unwrap();
        let ctx = orchestrator.context(&fixture.entities, &fixture.calls, None, &fixture.config);
        let first_response = resolve(ctx, &first).await;
        let second_response = resolve(ctx, &second).await;

        assert!(matches!(orchestrator.apply(first_response), ApplyOutcome::Discarded));
        assert!(matches!(orchestrator.apply(second_response), ApplyOutcome::Applied { .. }));
        assert_eq!(orchestrator.frame().label, "Data Access");
        assert_eq!(orchestrator.depth(), 1);
    }

    #[tokio::test]
    async fn process_steps_drill_into_component_graphs() {
        let fixture = Fixture::new();
        let mut orchestrator = Orchestrator::new(overview(), "System");

        let request = orchestrator.begin_drill(&NodeId::for_group("Data Access")).unwrap();
        let response = resolve(
            orchestrator.context(&fixture.entities, &fixture.calls, None, &fixture.config),
            &request,
        )
        .await;
        orchestrator.apply(response);
        let step = orchestrator.graph().nodes[1].id.clone();
        assert_eq!(orchestrator.graph().nodes[1].kind, NodeKind::Process);

        let outcome = orchestrator
            .drill(&fixture.entities, &fixture.calls, None, &fixture.config, &step)
            .await
            .unwrap();

        assert!(matches!(outcome, ApplyOutcome::Applied { strategy: "component graph", notice: None }));
        assert_eq!(orchestrator.breadcrumbs(), vec!["System", "Data Access", "repo.ts"]);
        let root = NodeId::for_root("repo.ts");
        assert!(orchestrator.graph().node(&root).is_some());
        assert!(orchestrator.cache().contains("src/data/repo.ts"));
    }

    #[tokio::test]
    async fn back_restores_the_previous_frame_and_collapses() {
        let fixture = Fixture::new();
        let before = overview();
        let mut orchestrator = Orchestrator::new(before.clone(), "System");
        orchestrator.expand(NodeId::for_group("Presentation"));

        orchestrator
            .drill(&fixture.entities, &fixture.calls, None, &fixture.config, &NodeId::for_group("Presentation"))
            .await
            .unwrap();
        assert!(orchestrator.expansion().is_empty());
        orchestrator.expand(NodeId::from("anything"));

        assert!(orchestrator.back());
        assert_eq!(orchestrator.graph(), &before);
        assert!(orchestrator.expansion().is_empty());
        assert!(!orchestrator.back());
    }

    #[tokio::test]
    async fn back_abandons_pending_requests() {
        let fixture = Fixture::new();
        let mut orchestrator = Orchestrator::new(overview(), "System");
        orchestrator
            .drill(&fixture.entities, &fixture.calls, None, &fixture.config, &NodeId::for_group("Presentation"))
            .await
            .unwrap();

        let step = orchestrator.graph().nodes[1].id.clone();
        let pending = orchestrator.begin_drill(&step).unwrap();
        assert!(orchestrator.back());
        let response = resolve(
            orchestrator.context(&fixture.entities, &fixture.calls, None, &fixture.config),
            &pending,
        )
        .await;

        assert!(matches!(orchestrator.apply(response), ApplyOutcome::Discarded));
        assert_eq!(orchestrator.depth(), 0);
    }

    #[tokio::test]
    async fn refreshes_are_suppressed_while_drilled_or_pending() {
        let fixture = Fixture::new();
        let mut orchestrator = Orchestrator::new(overview(), "System");
        orchestrator.expand(NodeId::for_group("Presentation"));

        assert_eq!(orchestrator.offer_refresh(overview()), RefreshOutcome::Applied);
        assert!(orchestrator.expansion().contains(&NodeId::for_group("Presentation")));

        let request = orchestrator.begin_drill(&NodeId::for_group("Presentation")).unwrap();
        assert_eq!(orchestrator.offer_refresh(Graph::default()), RefreshOutcome::Suppressed);

        let response = resolve(
            orchestrator.context(&fixture.entities, &fixture.calls, None, &fixture.config),
            &request,
        )
        .await;
        orchestrator.apply(response);
        assert_eq!(orchestrator.offer_refresh(Graph::default()), RefreshOutcome::Suppressed);
        assert!(!orchestrator.graph().is_empty());
    }

    #[test]
    fn activation_toggles_containers_and_jumps_to_leaves() {
        let group = GraphNode::new(NodeId::for_group("Core"), "Core", NodeKind::Module);
        let leaf = GraphNode::new(NodeId::from("src/a.rs#run@4"), "run", NodeKind::Component)
            .with_parent(Some(group.id.clone()))
            .with_location(SourceLocation { file: "src/a.rs".into(), start_line: 4, end_line: 9 });
        let bare = GraphNode::new(NodeId::from("x"), "x", NodeKind::Component);
        let mut orchestrator = Orchestrator::new(Graph::new(vec![group, leaf, bare], Vec::new()), "System");

        assert_eq!(orchestrator.activate(&NodeId::for_group("Core")).unwrap(), Activation::Toggled(true));
        assert_eq!(
            orchestrator.activate(&NodeId::from("src/a.rs#run@4")).unwrap(),
            Activation::Jump(JumpTarget { file: "src/a.rs".into(), line: 4 })
        );
        assert_eq!(orchestrator.activate(&NodeId::from("x")).unwrap(), Activation::Inert);
    }

    #[test]
    fn switching_scan_mode_off_clears_the_cache() {
        let mut orchestrator = Orchestrator::new(Graph::default(), "System");
        orchestrator.cache().insert("a.rs", Vec::new());
        orchestrator.set_scan_mode(false);
        assert!(orchestrator.cache().is_empty());
        assert!(!orchestrator.scan_mode().is_on());
    }
}
