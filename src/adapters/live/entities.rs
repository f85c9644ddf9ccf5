//! Live entity discovery backed by tree-sitter tags queries.

use std::path::PathBuf;

use super::tags;
use crate::entity::language::Language;
use crate::entity::Entity;
use crate::ports::{EntityProvider, PortFuture};

/// Reads files under `root` and parses them for definitions.
///
/// Files in unsupported languages yield an empty tree.
pub struct LiveEntityProvider {
    root: PathBuf,
}

impl LiveEntityProvider {
    /// Creates a provider resolving paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl EntityProvider for LiveEntityProvider {
    fn entities(&self, path: &str) -> PortFuture<'_, Vec<Entity>> {
        let language = Language::from_path(path);
        let full = self.root.join(path);
        Box::pin(async move {
            let Some(language) = language else {
                return Ok(Vec::new());
            };
            let source = std::fs::read_to_string(&full)
                .map_err(|e| format!("failed to read {}: {e}", full.display()))?;
            Ok(tags::entities(language, &source))
        })
    }
}
