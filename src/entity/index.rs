//! Bidirectional entity-id ↔ location index, built once per file batch.

use std::collections::HashMap;

use super::FileEntities;
use crate::graph::NodeId;

/// `(file, line)` key used to resolve call targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    /// File path.
    pub file: String,
    /// Zero-based line.
    pub line: u32,
}

impl LineKey {
    /// Builds a key.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self { file: file.into(), line }
    }
}

/// Resolves call targets to entity ids and entity ids back to their location.
#[derive(Debug, Default)]
pub struct LocationIndex {
    by_location: HashMap<LineKey, NodeId>,
    by_id: HashMap<NodeId, LineKey>,
}

impl LocationIndex {
    /// Indexes every entity of every file in the batch.
    ///
    /// Both the range start line and the name line resolve to the entity.
    /// When two entities start on the same line the outermost wins.
    #[must_use]
    pub fn build(files: &[FileEntities]) -> Self {
        let mut index = Self::default();
        for file in files {
            for (_, entity) in file.walk() {
                let id = entity.id_in(&file.path);
                let start = LineKey::new(file.path.as_str(), entity.start.line);
                index.by_location.entry(start.clone()).or_insert_with(|| id.clone());
                if entity.selection_start.line != entity.start.line {
                    let name_line = LineKey::new(file.path.as_str(), entity.selection_start.line);
                    index.by_location.entry(name_line).or_insert_with(|| id.clone());
                }
                index.by_id.entry(id).or_insert(start);
            }
        }
        index
    }

    /// Entity declared at `line` of `file`, if it is part of the batch.
    #[must_use]
    pub fn resolve(&self, file: &str, line: u32) -> Option<&NodeId> {
        self.by_location.get(&LineKey::new(file, line))
    }

    /// Location of an indexed entity.
    #[must_use]
    pub fn location(&self, id: &NodeId) -> Option<&LineKey> {
        self.by_id.get(id)
    }

    /// Number of indexed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
