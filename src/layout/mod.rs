//! Compound layout: positions a partially expanded node hierarchy.
//!
//! [`layout`] is a pure function of the graph, the expanded set and the
//! spacing parameters. It is re-run on every change rather than patched.

pub mod layered;
pub mod sizing;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::graph::{Edge, GraphNode, NodeId};
use layered::{arrange, Placement};
pub use sizing::{LayoutSpacing, Size};

/// An absolute point in layout units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// A node after layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    /// Node id.
    pub id: NodeId,
    /// Parent id, as in the input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// Absolute left edge.
    pub x: f64,
    /// Absolute top edge.
    pub y: f64,
    /// Left edge inside the parent's frame.
    pub relative_x: f64,
    /// Top edge inside the parent's frame.
    pub relative_y: f64,
    /// Rendered width.
    pub width: f64,
    /// Rendered height.
    pub height: f64,
    /// Whether every ancestor is expanded.
    pub visible: bool,
    /// Whether the node has children.
    pub container: bool,
    /// Whether the node is an expanded, visible container.
    pub expanded: bool,
}

/// An edge between two visible nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaidOutEdge {
    /// Source node id.
    pub source_id: NodeId,
    /// Target node id.
    pub target_id: NodeId,
    /// Underlying call count.
    pub weight: u32,
    /// Display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Bottom centre of the source.
    pub start: Point,
    /// Top centre of the target.
    pub end: Point,
}

/// Result of [`layout`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    /// One entry per distinct input node id, in input order.
    pub nodes: Vec<PositionedNode>,
    /// Edges whose endpoints are both visible.
    pub edges: Vec<LaidOutEdge>,
    /// Width of the top-level arrangement.
    pub width: f64,
    /// Height of the top-level arrangement.
    pub height: f64,
}

impl Layout {
    /// Looks up a positioned node.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Ids of the visible nodes.
    #[must_use]
    pub fn visible_ids(&self) -> BTreeSet<NodeId> {
        self.nodes.iter().filter(|n| n.visible).map(|n| n.id.clone()).collect()
    }
}

/// Parent/child structure over node indices. Duplicate ids keep the first
/// node; a parent id that names no node makes the child a root.
struct Tree<'a> {
    nodes: &'a [GraphNode],
    index: BTreeMap<&'a NodeId, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl<'a> Tree<'a> {
    fn new(nodes: &'a [GraphNode]) -> Self {
        let mut index = BTreeMap::new();
        for (i, node) in nodes.iter().enumerate() {
            index.entry(&node.id).or_insert(i);
        }
        let mut tree = Self { nodes, index, children: vec![Vec::new(); nodes.len()], roots: Vec::new() };
        let ordered: Vec<usize> = tree.index.values().copied().collect();
        for i in ordered {
            match tree.parent_of(i) {
                Some(p) if p != i => tree.children[p].push(i),
                Some(_) => {}
                None => tree.roots.push(i),
            }
        }
        tree
    }

    fn parent_of(&self, i: usize) -> Option<usize> {
        self.nodes[i].parent_id.as_ref().and_then(|p| self.index.get(p).copied())
    }

    /// Walks the parent chain: visible iff every ancestor is expanded.
    /// A chain that loops is never visible.
    fn is_visible(&self, i: usize, expanded: &BTreeSet<NodeId>) -> bool {
        let mut current = i;
        for _ in 0..=self.nodes.len() {
            let Some(parent) = self.parent_of(current) else {
                return true;
            };
            if !expanded.contains(&self.nodes[parent].id) {
                return false;
            }
            current = parent;
        }
        false
    }
}

struct Placer<'a> {
    tree: &'a Tree<'a>,
    expanded: &'a BTreeSet<NodeId>,
    spacing: &'a LayoutSpacing,
    links: BTreeSet<(usize, usize)>,
    sizes: Vec<Size>,
    relative: Vec<Placement>,
}

impl Placer<'_> {
    fn is_open(&self, i: usize) -> bool {
        !self.tree.children[i].is_empty() && self.expanded.contains(&self.tree.nodes[i].id)
    }

    /// Arranges `members` as siblings; returns their extent.
    fn arrange_siblings(&mut self, members: &[usize], origin: Placement) -> Size {
        let sizes: Vec<Size> = members.iter().map(|&m| self.measure(m)).collect();
        let keys: Vec<&str> = members.iter().map(|&m| self.tree.nodes[m].id.as_str()).collect();
        let local: BTreeMap<usize, usize> = members.iter().enumerate().map(|(k, &m)| (m, k)).collect();
        let edges: Vec<(usize, usize)> = self
            .links
            .iter()
            .filter_map(|(s, t)| Some((*local.get(s)?, *local.get(t)?)))
            .collect();

        let arrangement = arrange(&sizes, &keys, &edges, self.spacing);
        for (&m, placement) in members.iter().zip(&arrangement.placements) {
            self.relative[m] = Placement { x: origin.x + placement.x, y: origin.y + placement.y };
        }
        arrangement.extent
    }

    fn measure(&mut self, i: usize) -> Size {
        let size = if self.tree.children[i].is_empty() {
            sizing::leaf_size(&self.tree.nodes[i], self.spacing)
        } else if self.is_open(i) {
            let members = self.tree.children[i].clone();
            let origin = Placement { x: self.spacing.padding, y: self.spacing.header };
            let extent = self.arrange_siblings(&members, origin);
            sizing::container_size(extent, self.spacing)
        } else {
            self.spacing.collapsed
        };
        self.sizes[i] = size;
        size
    }
}

/// Lays out `nodes` and `edges` given the set of `expanded` containers.
///
/// Children of an expanded container are ranked by the edges among them
/// and placed inside it; the container grows to fit. Positions are computed
/// relative to the parent and then translated by the parent's origin.
#[must_use]
pub fn layout(
    nodes: &[GraphNode],
    edges: &[Edge],
    expanded: &BTreeSet<NodeId>,
    spacing: &LayoutSpacing,
) -> Layout {
    let tree = Tree::new(nodes);
    let links = edges
        .iter()
        .filter_map(|e| Some((*tree.index.get(&e.source_id)?, *tree.index.get(&e.target_id)?)))
        .filter(|(s, t)| s != t)
        .collect();
    let mut placer = Placer {
        tree: &tree,
        expanded,
        spacing,
        links,
        sizes: vec![Size::default(); nodes.len()],
        relative: vec![Placement::default(); nodes.len()],
    };
    let extent = placer.arrange_siblings(&tree.roots, Placement::default());

    let mut absolute = vec![Placement::default(); nodes.len()];
    let mut stack: Vec<usize> = tree.roots.clone();
    for &r in &tree.roots {
        absolute[r] = placer.relative[r];
    }
    while let Some(i) = stack.pop() {
        if !placer.is_open(i) {
            continue;
        }
        for &c in &tree.children[i] {
            absolute[c] = Placement {
                x: absolute[i].x + placer.relative[c].x,
                y: absolute[i].y + placer.relative[c].y,
            };
            stack.push(c);
        }
    }

    let visible: Vec<bool> = (0..nodes.len()).map(|i| tree.is_visible(i, expanded)).collect();
    let positioned: Vec<PositionedNode> = tree
        .index
        .values()
        .copied()
        .collect::<BTreeSet<usize>>()
        .into_iter()
        .map(|i| {
            let node = &nodes[i];
            let (abs, rel, size) = if visible[i] {
                (absolute[i], placer.relative[i], placer.sizes[i])
            } else {
                (Placement::default(), Placement::default(), Size::default())
            };
            PositionedNode {
                id: node.id.clone(),
                parent_id: node.parent_id.clone(),
                x: abs.x,
                y: abs.y,
                relative_x: rel.x,
                relative_y: rel.y,
                width: size.width,
                height: size.height,
                visible: visible[i],
                container: !tree.children[i].is_empty(),
                expanded: visible[i] && placer.is_open(i),
            }
        })
        .collect();

    let laid_out_edges = edges
        .iter()
        .filter_map(|e| {
            let s = *tree.index.get(&e.source_id)?;
            let t = *tree.index.get(&e.target_id)?;
            if s == t || !visible[s] || !visible[t] {
                return None;
            }
            Some(LaidOutEdge {
                source_id: e.source_id.clone(),
                target_id: e.target_id.clone(),
                weight: e.weight,
                label: e.label.clone(),
                start: Point {
                    x: absolute[s].x + placer.sizes[s].width / 2.0,
                    y: absolute[s].y + placer.sizes[s].height,
                },
                end: Point { x: absolute[t].x + placer.sizes[t].width / 2.0, y: absolute[t].y },
            })
        })
        .collect();

    Layout { nodes: positioned, edges: laid_out_edges, width: extent.width, height: extent.height }
}
