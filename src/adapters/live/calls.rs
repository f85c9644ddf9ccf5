//! Live relationship discovery by name matching.
//!
//! Call sites are the call-expression captures of the tags query inside a
//! callable's range. Each called name resolves to a callable declared in the
//! same file when there is one, otherwise to the only callable of that name
//! in the project. Names declared in several other files stay unresolved.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::{debug, warn};

use super::git::tracked_files;
use super::tags::{self, call_names};
use crate::entity::language::Language;
use crate::entity::{CallTarget, CallableEntity, FileEntities};
use crate::ports::{CallProvider, PortFuture};

/// Where a callable is declared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Definition {
    file: String,
    start_line: u32,
}

/// Callable declarations of a project, by name.
#[derive(Debug, Default)]
pub(crate) struct SymbolTable {
    by_name: HashMap<String, Vec<Definition>>,
}

impl SymbolTable {
    /// Indexes every callable of `files`.
    pub(crate) fn from_files(files: &[FileEntities]) -> Self {
        let mut table = Self::default();
        for file in files {
            for (_, entity) in file.walk() {
                if entity.kind.is_callable() {
                    table
                        .by_name
                        .entry(entity.name.clone())
                        .or_default()
                        .push(Definition { file: file.path.clone(), start_line: entity.start.line });
                }
            }
        }
        for definitions in table.by_name.values_mut() {
            definitions.sort();
        }
        table
    }

    /// Parses every supported file under `root`.
    fn index_project(root: &std::path::Path) -> Self {
        let paths = match tracked_files(root) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "cannot list project files, calls will not resolve");
                return Self::default();
            }
        };
        let files: Vec<FileEntities> = paths
            .into_iter()
            .filter_map(|path| {
                let language = Language::from_path(&path)?;
                let source = std::fs::read_to_string(root.join(&path)).ok()?;
                Some(FileEntities::new(path, tags::entities(language, &source)))
            })
            .collect();
        debug!(files = files.len(), "indexed callables for call resolution");
        Self::from_files(&files)
    }

    fn resolve(&self, name: &str, from_file: &str) -> Option<&Definition> {
        let definitions = self.by_name.get(name)?;
        definitions
            .iter()
            .find(|d| d.file == from_file)
            .or_else(|| (definitions.len() == 1).then(|| &definitions[0]))
    }
}

/// Name-matching call provider over the files under `root`.
///
/// The project is indexed on the first query.
pub struct LiveCallProvider {
    root: PathBuf,
    symbols: OnceLock<SymbolTable>,
}

impl LiveCallProvider {
    /// Creates a provider for the project at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), symbols: OnceLock::new() }
    }

    /// Creates a provider with a prebuilt symbol table.
    pub(crate) fn with_symbols(root: impl Into<PathBuf>, symbols: SymbolTable) -> Self {
        let provider = Self::new(root);
        let _ = provider.symbols.set(symbols);
        provider
    }

    fn calls_of(&self, entity: &CallableEntity) -> Result<Vec<CallTarget>, String> {
        let Some(language) = Language::from_path(&entity.file) else {
            return Ok(Vec::new());
        };
        let path = self.root.join(&entity.file);
        let source =
            std::fs::read_to_string(&path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        let symbols = self.symbols.get_or_init(|| SymbolTable::index_project(&self.root));
        let targets = call_names(language, &source, entity.start_line, entity.end_line)
            .into_iter()
            .filter_map(|name| {
                let definition = symbols.resolve(&name, &entity.file)?;
                Some(CallTarget {
                    target_file: definition.file.clone(),
                    target_start_line: definition.start_line,
                    target_name: name,
                })
            })
            .collect();
        Ok(targets)
    }
}

impl CallProvider for LiveCallProvider {
    fn outgoing_calls(&self, entity: &CallableEntity) -> PortFuture<'_, Vec<CallTarget>> {
        let result = self.calls_of(entity);
        Box::pin(async move { result.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityKind};
    use crate::graph::NodeId;

    fn callable(file: &str, name: &str, start_line: u32, end_line: u32) -> CallableEntity {
        CallableEntity {
            id: NodeId::for_entity(file, name, start_line),
            file: file.into(),
            name: name.into(),
            start_line,
            end_line,
        }
    }

    fn symbols() -> SymbolTable {
        SymbolTable::from_files(&[
            FileEntities::new(
                "src/main.rs",
                vec![
                    Entity::new("main", EntityKind::Function, 0, 4),
                    Entity::new("helper", EntityKind::Function, 6, 8),
                ],
            ),
            FileEntities::new("src/db.rs", vec![Entity::new("open", EntityKind::Function, 0, 2)]),
            FileEntities::new("src/a.rs", vec![Entity::new("helper", EntityKind::Function, 0, 1)]),
            FileEntities::new("src/b.rs", vec![Entity::new("close", EntityKind::Function, 0, 1)]),
            FileEntities::new("src/c.rs", vec![Entity::new("close", EntityKind::Function, 3, 4)]),
        ])
    }

    #[test]
    fn same_file_definitions_win_over_unique_ones() {
        let table = symbols();
        assert_eq!(table.resolve("helper", "src/main.rs").unwrap().start_line, 6);
        assert_eq!(table.resolve("helper", "src/other.rs"), None);
        assert_eq!(table.resolve("open", "src/main.rs").unwrap().file, "src/db.rs");
        assert_eq!(table.resolve("close", "src/main.rs"), None);
    }

    #[tokio::test]
    async fn reports_resolved_calls_inside_the_range() {
        let dir = std::env::temp_dir().join("archscope_live_calls_test");
        std::fs::create_dir_all(dir.join("src")).unwrap();
        std::fs::write(
            dir.join("src/main.rs"),
            "fn main() {\n    let db = open();\n    helper(db);\n    close();\n}\n\nfn helper() {\n    open();\n}\n",
        )
        .unwrap();

        let provider = LiveCallProvider::with_symbols(&dir, symbols());
        let calls = provider.outgoing_calls(&callable("src/main.rs", "main", 0, 4)).await.unwrap();

        let names: Vec<&str> = calls.iter().map(|c| c.target_name.as_str()).collect();
        assert_eq!(names, vec!["open", "helper"]);
        assert_eq!(calls[0].target_file, "src/db.rs");
        assert_eq!(calls[1].target_start_line, 6);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unsupported_files_have_no_calls() {
        let provider = LiveCallProvider::with_symbols("/nonexistent", SymbolTable::default());
        let calls = provider.outgoing_calls(&callable("README.md", "intro", 0, 3)).await.unwrap();
        assert!(calls.is_empty());
    }
}
