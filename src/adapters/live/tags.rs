//! Tree-sitter tagging backing the live entity and call providers.
//!
//! Each language ships a tags query (`queries/<lang>-tags.scm`) whose captures
//! follow the usual tags convention:
//! - `@definition.<kind>` - the whole definition node
//! - `@name.definition.<kind>` - its name
//! - `@name.reference.call` - the name at a call site
//!
//! Definition tags are nested by byte range into entity trees.

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::warn;
use tree_sitter::{Language as Grammar, Node, Parser, Point, Query, QueryCursor, Tree};

use crate::entity::language::Language;
use crate::entity::{Entity, EntityKind, Position};

/// Embedded query files.
mod queries {
    pub const RUST: &str = include_str!("../../../queries/rust-tags.scm");
    pub const PYTHON: &str = include_str!("../../../queries/python-tags.scm");
    pub const TYPESCRIPT: &str = include_str!("../../../queries/typescript-tags.scm");
    pub const GO: &str = include_str!("../../../queries/go-tags.scm");
    pub const JAVA: &str = include_str!("../../../queries/java-tags.scm");
}

const CALL_CAPTURE: &str = "name.reference.call";

/// Grammar and compiled tags query of one language.
struct LangConfig {
    grammar: Grammar,
    query: Query,
    capture_names: Vec<String>,
}

fn grammar(language: Language) -> Grammar {
    match language {
        Language::Rust => tree_sitter_rust::language(),
        Language::Python => tree_sitter_python::language(),
        Language::TypeScript => tree_sitter_typescript::language_typescript(),
        Language::Tsx => tree_sitter_typescript::language_tsx(),
        Language::Go => tree_sitter_go::language(),
        Language::Java => tree_sitter_java::language(),
    }
}

fn query_source(language: Language) -> &'static str {
    match language {
        Language::Rust => queries::RUST,
        Language::Python => queries::PYTHON,
        Language::TypeScript | Language::Tsx => queries::TYPESCRIPT,
        Language::Go => queries::GO,
        Language::Java => queries::JAVA,
    }
}

/// Compiled configurations, built on first use. A language whose query does
/// not compile against its grammar is left out and yields no tags.
fn config(language: Language) -> Option<&'static LangConfig> {
    static CONFIGS: OnceLock<HashMap<Language, LangConfig>> = OnceLock::new();
    CONFIGS
        .get_or_init(|| {
            Language::ALL
                .into_iter()
                .filter_map(|language| {
                    let grammar = grammar(language);
                    match Query::new(&grammar, query_source(language)) {
                        Ok(query) => {
                            let capture_names = query.capture_names().iter().map(|s| s.to_string()).collect();
                            Some((language, LangConfig { grammar, query, capture_names }))
                        }
                        Err(e) => {
                            warn!(?language, error = %e, "failed to compile tags query");
                            None
                        }
                    }
                })
                .collect()
        })
        .get(&language)
}

fn parse(config: &LangConfig, source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&config.grammar).ok()?;
    parser.parse(source, None)
}

/// What a `definition.<kind>` capture stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Entity(EntityKind),
    /// A Rust `impl` block, folded into its self type.
    Impl,
    /// A top-level JS/TS variable; its value decides the kind.
    Declarator,
}

impl TagKind {
    fn parse(tag: &str) -> Option<Self> {
        let kind = match tag {
            "class" => EntityKind::Class,
            "interface" => EntityKind::Interface,
            "struct" => EntityKind::Struct,
            "enum" => EntityKind::Enum,
            "function" => EntityKind::Function,
            "method" => EntityKind::Method,
            "constant" => EntityKind::Constant,
            "variable" => EntityKind::Variable,
            "module" => EntityKind::Module,
            "impl" => return Some(Self::Impl),
            "declarator" => return Some(Self::Declarator),
            _ => return None,
        };
        Some(Self::Entity(kind))
    }
}

/// A definition found by the tags query, before nesting.
struct Tag {
    entity: Entity,
    start_byte: usize,
    end_byte: usize,
    /// Receiver type of a Go method.
    receiver: Option<String>,
}

/// Parses `source` and returns its top-level entities.
///
/// Source that fails to parse yields an empty tree.
#[must_use]
pub fn entities(language: Language, source: &str) -> Vec<Entity> {
    let Some(config) = config(language) else {
        return Vec::new();
    };
    let Some(tree) = parse(config, source) else {
        return Vec::new();
    };

    let mut tags = Vec::new();
    let mut cursor = QueryCursor::new();
    for m in cursor.matches(&config.query, tree.root_node(), source.as_bytes()) {
        let mut definition: Option<(TagKind, Node<'_>)> = None;
        let mut name: Option<Node<'_>> = None;
        let mut receiver: Option<Node<'_>> = None;
        let mut value: Option<Node<'_>> = None;

        for capture in m.captures {
            let capture_name = config.capture_names.get(capture.index as usize).map_or("", String::as_str);
            if capture_name.starts_with("name.definition.") {
                name = Some(capture.node);
            } else if let Some(tag) = capture_name.strip_prefix("definition.") {
                definition = TagKind::parse(tag).map(|kind| (kind, capture.node));
            } else if capture_name == "receiver" {
                receiver = Some(capture.node);
            } else if capture_name == "value" {
                value = Some(capture.node);
            }
        }

        let (Some((kind, node)), Some(name)) = (definition, name) else {
            continue;
        };
        let Ok(text) = name.utf8_text(source.as_bytes()) else {
            continue;
        };
        let Some(kind) = entity_kind(language, kind, node, text, value) else {
            continue;
        };

        let mut entity = Entity::new(text, kind, row(node.start_position()), end_row(node));
        entity.selection_start = selection(name, source);
        tags.push(Tag {
            entity,
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            receiver: receiver.and_then(|r| r.utf8_text(source.as_bytes()).ok()).map(String::from),
        });
    }

    let entities = nest(tags);
    match language {
        Language::Rust | Language::Go => merge_types(entities),
        _ => entities,
    }
}

/// Names called between `start_line` and `end_line` (inclusive), in source
/// order, without duplicates.
pub(crate) fn call_names(language: Language, source: &str, start_line: u32, end_line: u32) -> Vec<String> {
    let Some(config) = config(language) else {
        return Vec::new();
    };
    let Some(tree) = parse(config, source) else {
        return Vec::new();
    };
    let (first, last) = (start_line as usize, end_line as usize);

    let mut cursor = QueryCursor::new();
    cursor.set_point_range(Point::new(first, 0)..Point::new(last + 1, 0));
    let mut sites: Vec<(usize, &str)> = Vec::new();
    for m in cursor.matches(&config.query, tree.root_node(), source.as_bytes()) {
        for capture in m.captures {
            if config.capture_names.get(capture.index as usize).map(String::as_str) != Some(CALL_CAPTURE) {
                continue;
            }
            let row = capture.node.start_position().row;
            if row < first || row > last {
                continue;
            }
            if let Ok(name) = capture.node.utf8_text(source.as_bytes()) {
                sites.push((capture.node.start_byte(), name));
            }
        }
    }
    sites.sort_by_key(|(byte, _)| *byte);

    let mut names: Vec<String> = Vec::new();
    for (_, name) in sites {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn entity_kind(language: Language, kind: TagKind, node: Node<'_>, name: &str, value: Option<Node<'_>>) -> Option<EntityKind> {
    match kind {
        TagKind::Impl => Some(EntityKind::Struct),
        TagKind::Declarator => {
            let callable = value
                .is_some_and(|v| matches!(v.kind(), "arrow_function" | "function_expression" | "function"));
            let constant = node
                .parent()
                .and_then(|declaration| declaration.child(0))
                .is_some_and(|keyword| keyword.kind() == "const");
            Some(if callable {
                EntityKind::Function
            } else if constant {
                EntityKind::Constant
            } else {
                EntityKind::Variable
            })
        }
        // Python module assignments only count when named like constants.
        TagKind::Entity(EntityKind::Constant) if language == Language::Python => {
            is_constant_name(name).then_some(EntityKind::Constant)
        }
        TagKind::Entity(kind) => Some(kind),
    }
}

fn is_constant_name(name: &str) -> bool {
    name.chars().any(char::is_uppercase) && name.chars().all(|c| c.is_uppercase() || c.is_ascii_digit() || c == '_')
}

fn row(point: Point) -> u32 {
    u32::try_from(point.row).unwrap_or(u32::MAX)
}

/// Last line of `node`. A range ending at column 0 ends on the previous line.
fn end_row(node: Node<'_>) -> u32 {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        row(end) - 1
    } else {
        row(end)
    }
}

/// Position of `name`, with the character offset counted in chars.
fn selection(name: Node<'_>, source: &str) -> Position {
    let start = name.start_position();
    let line_start = name.start_byte().saturating_sub(start.column);
    let character = source.get(line_start..name.start_byte()).map_or(0, |prefix| prefix.chars().count());
    Position { line: row(start), character: u32::try_from(character).unwrap_or(u32::MAX) }
}

/// Builds entity trees from tags: a tag is a child of the innermost tag whose
/// range contains it.
fn nest(mut tags: Vec<Tag>) -> Vec<Entity> {
    tags.sort_by(|a, b| a.start_byte.cmp(&b.start_byte).then(b.end_byte.cmp(&a.end_byte)));
    tags.dedup_by(|b, a| a.start_byte == b.start_byte && a.end_byte == b.end_byte && a.entity.name == b.entity.name);

    let mut stack: Vec<Tag> = Vec::new();
    let mut top: Vec<Entity> = Vec::new();
    for tag in tags {
        while stack.last().is_some_and(|open| open.end_byte < tag.end_byte) {
            if let Some(done) = stack.pop() {
                close(done, &mut stack, &mut top);
            }
        }
        stack.push(tag);
    }
    while let Some(done) = stack.pop() {
        close(done, &mut stack, &mut top);
    }
    top
}

/// Attaches a finished tag to its parent, or to the top level.
fn close(tag: Tag, stack: &mut [Tag], top: &mut Vec<Entity>) {
    let mut entity = tag.entity;
    match stack.last_mut() {
        Some(parent) => {
            if parent.entity.kind.is_type() && entity.kind == EntityKind::Function {
                entity.kind = EntityKind::Method;
            }
            parent.entity.children.push(entity);
        }
        None => match tag.receiver {
            Some(receiver) => {
                let mut owner = Entity::new(receiver, EntityKind::Struct, entity.start.line, entity.end.line);
                owner.selection_start = entity.selection_start;
                owner.children.push(entity);
                top.push(owner);
            }
            None => top.push(entity),
        },
    }
}

/// Folds same-named type entities (a Rust type and its `impl` blocks, a Go
/// type and its methods) into the first one.
fn merge_types(entities: Vec<Entity>) -> Vec<Entity> {
    let mut out: Vec<Entity> = Vec::with_capacity(entities.len());
    for entity in entities {
        if entity.kind.is_type() {
            if let Some(existing) = out.iter_mut().find(|e| e.kind.is_type() && e.name == entity.name) {
                existing.children.extend(entity.children);
                continue;
            }
        }
        out.push(entity);
    }
    out
}
