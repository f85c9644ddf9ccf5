//! The top-level overview shown before any drill.

use std::path::Path;

use tracing::info;

use crate::assemble::{assemble, AssembleOptions, Assembly, Granularity};
use crate::config::EngineConfig;
use crate::context::ServiceContext;
use crate::drill::cache::EntityCache;
use crate::entity::language::is_supported;
use crate::error::{EngineError, Result};
use crate::inference::grouping::{infer_groups, GroupSource};
use crate::ports::GitRepo;

/// Label of the overview when none is given.
pub const DEFAULT_ROOT_LABEL: &str = "System";

/// How the overview is built.
#[derive(Debug, Clone, Copy)]
pub struct OverviewOptions<'a> {
    /// Containment level.
    pub granularity: Granularity,
    /// Label of a synthesized root adopting every group.
    pub root_label: Option<&'a str>,
}

/// The assembled overview and how its groups were chosen.
#[derive(Debug, Clone)]
pub struct Overview {
    /// Source files the overview covers.
    pub files: Vec<String>,
    /// Assembled graph with ownership and aggregation stats.
    pub assembly: Assembly,
    /// Whether the groups were inferred or classified heuristically.
    pub grouping: GroupSource,
}

impl Overview {
    /// Label of the overview frame.
    #[must_use]
    pub fn label<'a>(options: &OverviewOptions<'a>) -> &'a str {
        options.root_label.unwrap_or(DEFAULT_ROOT_LABEL)
    }
}

/// Source files of the project at `root` in a supported language, sorted.
///
/// # Errors
///
/// Returns [`EngineError::Collaborator`] when the file listing fails.
pub fn source_files(git: &dyn GitRepo, root: &Path) -> Result<Vec<String>> {
    let mut files: Vec<String> = git
        .list_files(root)
        .map_err(|e| EngineError::Collaborator { collaborator: "git", message: e.to_string() })?
        .into_iter()
        .filter(|path| is_supported(path))
        .collect();
    files.sort();
    files.dedup();
    Ok(files)
}

/// Builds the overview of the project at `root`.
///
/// Files are grouped into conceptual modules (inferred when a model is
/// configured, classified by path otherwise) and assembled at the requested
/// granularity. Entity trees go through `cache`.
///
/// # Errors
///
/// Returns [`EngineError::Collaborator`] when the file listing fails.
pub async fn overview(
    ctx: &ServiceContext,
    cache: &EntityCache,
    root: &Path,
    config: &EngineConfig,
    options: &OverviewOptions<'_>,
) -> Result<Overview> {
    let files = source_files(ctx.git.as_ref(), root)?;
    let loaded = cache.load_all(ctx.entities.as_ref(), &files).await;
    let grouping = infer_groups(ctx.llm(), config, &files).await;

    let assembly = assemble(
        ctx.calls.as_ref(),
        &loaded,
        &AssembleOptions {
            granularity: options.granularity,
            semantic_groups: Some(&grouping.groups),
            virtual_root_label: options.root_label,
            default_group: &config.default_group,
        },
    )
    .await;

    info!(
        files = files.len(),
        nodes = assembly.graph.nodes.len(),
        edges = assembly.graph.edges.len(),
        grouping = ?grouping.source,
        "overview assembled"
    );
    Ok(Overview { files, assembly, grouping: grouping.source })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::graph::{NodeId, NodeKind};
    use crate::ports::PortError;

    struct Listing(std::result::Result<Vec<&'static str>, &'static str>);

    impl GitRepo for Listing {
        fn list_files(&self, _path: &Path) -> std::result::Result<Vec<String>, PortError> {
            match &self.0 {
                Ok(files) => Ok(files.iter().map(|f| (*f).to_string()).collect()),
                Err(e) => Err((*e).into()),
            }
        }
    }

    #[test]
    fn only_supported_sources_are_kept() {
        let git = Listing(Ok(vec!["src/main.rs", "README.md", "web/app.ts", "src/main.rs", "Cargo.toml"]));
        let files = source_files(&git, Path::new(".")).unwrap();
        assert_eq!(files, vec!["src/main.rs".to_string(), "web/app.ts".to_string()]);
    }

    #[test]
    fn listing_failures_are_collaborator_errors() {
        let git = Listing(Err("not a git repository"));
        let err = source_files(&git, Path::new(".")).unwrap_err();
        assert!(matches!(err, EngineError::Collaborator { collaborator: "git", .. }));
    }

    #[tokio::test]
    async fn process_overview_has_one_system_per_group() {
        let dir = std::env::temp_dir().join("archscope_workspace_test");
        std::fs::create_dir_all(dir.join("src/db")).unwrap();
        std::fs::create_dir_all(dir.join("src/ui")).unwrap();
        std::fs::write(dir.join("src/db/repo.py"), "def load():\n    return 1\n").unwrap();
        std::fs::write(dir.join("src/ui/view.py"), "def show():\n    return load()\n").unwrap();

        let config = EngineConfig::default();
        let mut ctx = ServiceContext::live(&dir, &config);
        ctx.git = Box::new(Listing(Ok(vec!["src/db/repo.py", "src/ui/view.py"])));
        let cache = EntityCache::default();
        let options = OverviewOptions { granularity: Granularity::Process, root_label: None };

        let overview = overview(&ctx, &cache, &dir, &config, &options).await.unwrap();
        let graph = &overview.assembly.graph;

        let systems: Vec<&str> =
            graph.nodes.iter().filter(|n| n.kind == NodeKind::System).map(|n| n.label.as_str()).collect();
        assert_eq!(systems, vec!["Data Access", "Presentation"]);
        assert_eq!(overview.grouping, GroupSource::Heuristic);
        let weights = graph.edge_weights();
        let key = (NodeId::for_group("Presentation"), NodeId::for_group("Data Access"));
        assert_eq!(weights.get(&key), Some(&1));
        assert_eq!(cache.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
