//! Spacing parameters and content-aware node sizing.

use serde::{Deserialize, Serialize};

use crate::graph::GraphNode;

/// A width/height pair in layout units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Creates a size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Layout spacing parameters (layout units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSpacing {
    /// Size of a collapsed container.
    pub collapsed: Size,
    /// Minimum size of an expanded container before it grows to fit.
    pub seed: Size,
    /// Narrowest leaf.
    pub leaf_min_width: f64,
    /// Widest leaf.
    pub leaf_max_width: f64,
    /// Height of a leaf without description.
    pub leaf_height: f64,
    /// Approximate width of one label character.
    pub char_width: f64,
    /// Height added per description line.
    pub line_height: f64,
    /// Most description lines accounted for.
    pub max_description_lines: u32,
    /// Inner padding of containers and leaves.
    pub padding: f64,
    /// Space reserved above a container's children for its title.
    pub header: f64,
    /// Gap between siblings of the same rank.
    pub node_gap: f64,
    /// Gap between ranks.
    pub rank_gap: f64,
}

impl Default for LayoutSpacing {
    fn default() -> Self {
        Self {
            collapsed: Size::new(220.0, 80.0),
            seed: Size::new(60.0, 40.0),
            leaf_min_width: 120.0,
            leaf_max_width: 320.0,
            leaf_height: 48.0,
            char_width: 7.5,
            line_height: 16.0,
            max_description_lines: 3,
            padding: 20.0,
            header: 32.0,
            node_gap: 30.0,
            rank_gap: 60.0,
        }
    }
}

/// Size of a leaf: label-driven width within `[leaf_min_width, leaf_max_width]`,
/// plus one line of height per wrapped description line.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn leaf_size(node: &GraphNode, spacing: &LayoutSpacing) -> Size {
    let label_width = node.label.chars().count() as f64 * spacing.char_width + 2.0 * spacing.padding;
    let width = label_width.clamp(spacing.leaf_min_width, spacing.leaf_max_width);

    let lines = node.description().map_or(0.0, |text| {
        let text_width = text.chars().count() as f64 * spacing.char_width;
        let usable = (width - 2.0 * spacing.padding).max(spacing.char_width);
        (text_width / usable).ceil().min(f64::from(spacing.max_description_lines))
    });
    Size::new(width, spacing.leaf_height + lines * spacing.line_height)
}

/// Size of an expanded container whose children span `content`.
#[must_use]
pub fn container_size(content: Size, spacing: &LayoutSpacing) -> Size {
    Size::new(
        (content.width + 2.0 * spacing.padding).max(spacing.seed.width),
        (content.height + spacing.header + spacing.padding).max(spacing.seed.height),
    )
}
