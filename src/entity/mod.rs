//! Code entities as reported by the entity-discovery collaborator.

pub mod index;
pub mod language;

use serde::{Deserialize, Serialize};

use crate::graph::{NodeId, SourceLocation};

/// Kind tag of a discovered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A class.
    Class,
    /// An interface, trait or protocol.
    Interface,
    /// A struct.
    Struct,
    /// An enum.
    Enum,
    /// A free function.
    Function,
    /// A method or associated function.
    Method,
    /// A constant or static.
    Constant,
    /// A module-level variable.
    Variable,
    /// A namespace or inline module.
    Module,
    /// Anything else (fields, properties, type aliases, ...).
    Other,
}

impl EntityKind {
    /// Whether outgoing calls are queried for this kind.
    #[must_use]
    pub fn is_callable(self) -> bool {
        matches!(self, Self::Function | Self::Method)
    }

    /// Whether this kind is rendered as a container-like component.
    #[must_use]
    pub fn is_type(self) -> bool {
        matches!(self, Self::Class | Self::Interface | Self::Struct | Self::Enum)
    }

    /// Whether a top-level entity of this kind becomes its own node.
    #[must_use]
    pub fn is_renderable(self) -> bool {
        self.is_type() || matches!(self, Self::Function | Self::Constant | Self::Variable)
    }

    /// Lowercase tag stored on rendered nodes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Function => "function",
            Self::Method => "method",
            Self::Constant => "constant",
            Self::Variable => "variable",
            Self::Module => "module",
            Self::Other => "other",
        }
    }
}

/// Zero-based line/character position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based line.
    pub line: u32,
    /// Zero-based character offset.
    pub character: u32,
}

impl Position {
    /// Position at the start of `line`.
    #[must_use]
    pub fn line(line: u32) -> Self {
        Self { line, character: 0 }
    }
}

/// A named code construct with a source range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Declared name.
    pub name: String,
    /// Kind tag.
    pub kind: EntityKind,
    /// Start of the full range.
    pub start: Position,
    /// End of the full range.
    pub end: Position,
    /// Start of the name itself.
    pub selection_start: Position,
    /// Nested entities.
    #[serde(default)]
    pub children: Vec<Entity>,
}

impl Entity {
    /// Creates a childless entity spanning `start_line..=end_line`.
    pub fn new(name: impl Into<String>, kind: EntityKind, start_line: u32, end_line: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            start: Position::line(start_line),
            end: Position::line(end_line),
            selection_start: Position::line(start_line),
            children: Vec::new(),
        }
    }

    /// Adds nested entities.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Entity>) -> Self {
        self.children = children;
        self
    }

    /// Id of this entity when declared in `file`.
    #[must_use]
    pub fn id_in(&self, file: &str) -> NodeId {
        NodeId::for_entity(file, &self.name, self.start.line)
    }

    /// Source range of this entity when declared in `file`.
    #[must_use]
    pub fn location_in(&self, file: &str) -> SourceLocation {
        SourceLocation { file: file.to_string(), start_line: self.start.line, end_line: self.end.line }
    }
}

/// The entity tree of one file snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntities {
    /// File path relative to the project root.
    pub path: String,
    /// Top-level entities in declaration order.
    pub entities: Vec<Entity>,
}

impl FileEntities {
    /// Creates a file snapshot.
    pub fn new(path: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self { path: path.into(), entities }
    }

    /// Short display name (last path segment).
    #[must_use]
    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }

    /// Depth-first walk over every entity with its nesting depth.
    pub fn walk(&self) -> Vec<(usize, &Entity)> {
        fn visit<'a>(entities: &'a [Entity], depth: usize, out: &mut Vec<(usize, &'a Entity)>) {
            for entity in entities {
                out.push((depth, entity));
                visit(&entity.children, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.entities, 0, &mut out);
        out
    }
}

/// Last path segment of a `/`-separated path.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// A callable entity queried for outgoing calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallableEntity {
    /// Entity id.
    pub id: NodeId,
    /// File declaring the entity.
    pub file: String,
    /// Declared name.
    pub name: String,
    /// Zero-based start line.
    pub start_line: u32,
    /// Zero-based end line.
    pub end_line: u32,
}

/// One outgoing call reported by the relationship collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallTarget {
    /// File declaring the callee.
    pub target_file: String,
    /// Zero-based start line of the callee.
    pub target_start_line: u32,
    /// Callee name.
    pub target_name: String,
}
