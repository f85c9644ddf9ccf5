//! Ownership resolution: assigns every entity of a file to exactly one node.
//!
//! This is the pure "classify and map" pass. It produces the nodes a file
//! contributes at a given granularity plus the [`OwnerMap`] used later to
//! lift entity-level calls onto those nodes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::{CallableEntity, Entity, EntityKind, FileEntities};
use crate::error::{EngineError, Result};
use crate::graph::{GraphNode, NodeId, NodeKind};

/// Label of the fallback container.
pub const SYNTHETIC_ROOT_LABEL: &str = "System";

/// Level of containment used when mapping entities to nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// File nodes containing class and top-level function nodes.
    #[default]
    Full,
    /// No file nodes; classes and functions sit directly in the container.
    Flattened,
    /// No entity nodes; everything belongs to the container itself.
    Process,
}

/// Maps entity ids to the id of the node that visually represents them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerMap {
    owners: HashMap<NodeId, NodeId>,
}

impl OwnerMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `entity` is drawn as `owner`. The first assignment wins.
    pub fn assign(&mut self, entity: NodeId, owner: NodeId) {
        self.owners.entry(entity).or_insert(owner);
    }

    /// Owner of `entity`.
    #[must_use]
    pub fn owner_of(&self, entity: &NodeId) -> Option<&NodeId> {
        self.owners.get(entity)
    }

    /// Moves every assignment of `other` into this map.
    pub fn merge(&mut self, other: OwnerMap) {
        for (entity, owner) in other.owners {
            self.assign(entity, owner);
        }
    }

    /// Number of mapped entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether no entity is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Iterates `(entity, owner)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> {
        self.owners.iter()
    }
}

/// Output of resolving one file.
#[derive(Debug, Clone, Default)]
pub struct Ownership {
    /// Nodes contributed by the file.
    pub nodes: Vec<GraphNode>,
    /// Entity → owner assignments for the file.
    pub owners: OwnerMap,
    /// Callable entities to query for outgoing calls.
    pub callables: Vec<CallableEntity>,
}

/// The fallback container node.
#[must_use]
pub fn synthetic_root() -> GraphNode {
    GraphNode::new(NodeId::synthetic_root(), SYNTHETIC_ROOT_LABEL, NodeKind::System)
}

/// Resolves the owners of every entity in `file`.
///
/// `container` is the node the file's top-level output is parented to. When
/// it is `None` in flattened or process mode, the synthetic root is used and
/// emitted so no entity is left without an owner.
#[must_use]
pub fn resolve(file: &FileEntities, granularity: Granularity, container: Option<&NodeId>) -> Ownership {
    let mut out = Ownership { callables: callables_of(file), ..Ownership::default() };

    match granularity {
        Granularity::Full => {
            let file_id = NodeId::for_file(&file.path);
            out.nodes.push(
                GraphNode::new(file_id.clone(), file.file_name(), NodeKind::File)
                    .with_parent(container.cloned())
                    .with_files(vec![file.path.clone()]),
            );
            place(file, &file.entities, &file_id, false, &mut out);
        }
        Granularity::Flattened | Granularity::Process => {
            let container = container_of(file, container).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "using synthetic root");
                out.nodes.push(synthetic_root());
                NodeId::synthetic_root()
            });
            if granularity == Granularity::Flattened {
                place(file, &file.entities, &container, true, &mut out);
            } else {
                for (_, entity) in file.walk() {
                    out.owners.assign(entity.id_in(&file.path), container.clone());
                }
            }
        }
    }

    out
}

/// Container a flattened or process-level file is parented to.
fn container_of(file: &FileEntities, container: Option<&NodeId>) -> Result<NodeId> {
    container
        .cloned()
        .ok_or_else(|| EngineError::Structural(format!("no container for {}", file.path)))
}

/// Renders the top-level entities under `parent` and maps the rest onto it.
fn place(file: &FileEntities, entities: &[Entity], parent: &NodeId, flattened: bool, out: &mut Ownership) {
    for entity in entities {
        let id = entity.id_in(&file.path);
        if entity.kind.is_renderable() {
            let mut node = GraphNode::new(id.clone(), entity.name.clone(), NodeKind::Component)
                .with_parent(Some(parent.clone()))
                .with_location(entity.location_in(&file.path))
                .with_attribute("entity_kind", entity.kind.as_str());
            if flattened {
                node = node.with_attribute("description", file.path.clone());
            }
            out.nodes.push(node);
            map_subtree(file, entity, &id, &mut out.owners);
        } else if entity.kind == EntityKind::Module {
            out.owners.assign(id, parent.clone());
            place(file, &entity.children, parent, flattened, out);
        } else {
            map_subtree(file, entity, parent, &mut out.owners);
        }
    }
}

/// Maps `entity` and all of its descendants onto `owner`.
fn map_subtree(file: &FileEntities, entity: &Entity, owner: &NodeId, owners: &mut OwnerMap) {
    owners.assign(entity.id_in(&file.path), owner.clone());
    for child in &entity.children {
        map_subtree(file, child, owner, owners);
    }
}

/// Callable entities of the file, ordered by line.
fn callables_of(file: &FileEntities) -> Vec<CallableEntity> {
    let mut callables: Vec<CallableEntity> = file
        .walk()
        .into_iter()
        .filter(|(_, e)| e.kind.is_callable())
        .map(|(_, e)| CallableEntity {
            id: e.id_in(&file.path),
            file: file.path.clone(),
            name: e.name.clone(),
            start_line: e.start.line,
            end_line: e.end.line,
        })
        .collect();
    callables.sort_by(|a, b| (a.start_line, &a.name).cmp(&(b.start_line, &b.name)));
    callables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_file() -> FileEntities {
        FileEntities::new(
            "src/service.ts",
            vec![
                Entity::new("Service", EntityKind::Class, 0, 20).with_children(vec![
                    Entity::new("start", EntityKind::Method, 2, 8),
                    Entity::new("stop", EntityKind::Method, 10, 18),
                ]),
                Entity::new("helper", EntityKind::Function, 22, 25),
                Entity::new("LIMIT", EntityKind::Constant, 27, 27),
            ],
        )
    }

    #[test]
    fn full_mode_parents_classes_and_functions_to_the_file() {
        let file = service_file();
        let ownership = resolve(&file, Granularity::Full, None);
        let file_id = NodeId::for_file("src/service.ts");

        assert_eq!(ownership.nodes.len(), 4);
        assert_eq!(ownership.nodes[0].id, file_id);
        assert_eq!(ownership.nodes[0].kind, NodeKind::File);
        assert_eq!(ownership.nodes[0].parent_id, None);
        for node in &ownership.nodes[1..] {
            assert_eq!(node.parent_id.as_ref(), Some(&file_id));
        }

        let class_id = NodeId::for_entity("src/service.ts", "Service", 0);
        let method_id = NodeId::for_entity("src/service.ts", "stop", 10);
        assert_eq!(ownership.owners.owner_of(&method_id), Some(&class_id));
        assert_eq!(ownership.owners.len(), 5);
    }

    #[test]
    fn flattened_mode_with_only_functions_parents_them_to_the_container() {
        let file = FileEntities::new(
            "src/util.py",
            vec![
                Entity::new("a", EntityKind::Function, 0, 2),
                Entity::new("b", EntityKind::Function, 4, 6),
                Entity::new("c", EntityKind::Function, 8, 9),
            ],
        );
        let container = NodeId::for_group("Utilities");
        let ownership = resolve(&file, Granularity::Flattened, Some(&container));

        assert_eq!(ownership.nodes.len(), 3);
        assert!(ownership.nodes.iter().all(|n| n.kind != NodeKind::File));
        assert!(ownership.nodes.iter().all(|n| n.parent_id.as_ref() == Some(&container)));
        assert_eq!(ownership.callables.len(), 3);
    }

    #[test]
    fn empty_file_renders_as_a_single_leaf_in_full_mode() {
        let file = FileEntities::new("README.md", vec![]);
        let ownership = resolve(&file, Granularity::Full, None);

        assert_eq!(ownership.nodes.len(), 1);
        assert_eq!(ownership.nodes[0].label, "README.md");
        assert!(ownership.owners.is_empty());
    }

    #[test]
    fn missing_container_falls_back_to_the_synthetic_root() {
        let file = FileEntities::new(
            "lib.rs",
            vec![Entity::new("field", EntityKind::Other, 0, 0)],
        );
        let ownership = resolve(&file, Granularity::Flattened, None);

        assert_eq!(ownership.nodes.len(), 1);
        assert_eq!(ownership.nodes[0].id, NodeId::synthetic_root());
        assert_eq!(
            ownership.owners.owner_of(&NodeId::for_entity("lib.rs", "field", 0)),
            Some(&NodeId::synthetic_root())
        );
    }

    #[test]
    fn missing_container_is_a_recoverable_structural_error() {
        let file = FileEntities::new("lib.rs", Vec::new());
        let err = container_of(&file, None).unwrap_err();

        assert!(matches!(err, EngineError::Structural(_)));
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "structural: no container for lib.rs");
        assert_eq!(container_of(&file, Some(&NodeId::from("group:Core"))).unwrap(), NodeId::from("group:Core"));
    }

    #[test]
    fn namespace_children_are_treated_as_top_level() {
        let file = FileEntities::new(
            "mod.rs",
            vec![Entity::new("inner", EntityKind::Module, 0, 10)
                .with_children(vec![Entity::new("Thing", EntityKind::Struct, 1, 3)])],
        );
        let ownership = resolve(&file, Granularity::Full, None);
        let thing = NodeId::for_entity("mod.rs", "Thing", 1);

        assert!(ownership.nodes.iter().any(|n| n.id == thing));
        assert_eq!(
            ownership.owners.owner_of(&NodeId::for_entity("mod.rs", "inner", 0)),
            Some(&NodeId::for_file("mod.rs"))
        );
    }

    #[test]
    fn process_mode_maps_everything_to_the_container() {
        let file = service_file();
        let group = NodeId::for_group("Core");
        let ownership = resolve(&file, Granularity::Process, Some(&group));

        assert!(ownership.nodes.is_empty());
        assert_eq!(ownership.owners.len(), 5);
        assert!(ownership.owners.iter().all(|(_, owner)| owner == &group));
    }
}
