//! Document model: shapes, their kind-dependent geometry, and snapshots.
//!
//! DESIGN
//! ======
//! The engine never owns the scene graph; it reads immutable
//! [`DocumentSnapshot`]s for resolution and layout math and mutates only
//! through the [`crate::api::DocumentApi`] seam. Geometry is a closed
//! tagged enum so operation dispatch is exhaustive and adding a shape
//! kind is compile-time-checked. "Stable document order" is ascending
//! `(z_index, id)` — the draw order every collaborator already agrees on.

#[cfg(test)]
#[path = "document_test.rs"]
mod document_test;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a shape.
pub type ShapeId = Uuid;

// =============================================================================
// KIND & GEOMETRY
// =============================================================================

/// The kind of a shape, independent of its measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Triangle,
    Line,
    Text,
}

impl ShapeKind {
    /// Lowercase wire name, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Line => "line",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approximate advance width of one glyph as a fraction of font size.
/// Used for text extents when no renderer is available to measure.
const TEXT_GLYPH_ASPECT: f64 = 0.6;

/// Line height as a fraction of font size.
const TEXT_LINE_HEIGHT: f64 = 1.2;

/// Kind-dependent measurements of a shape.
///
/// `x`/`y` live on [`ShapeSnapshot`]; this enum carries only what varies
/// per kind. Lines store their far endpoint in absolute coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeGeometry {
    Rectangle { width: f64, height: f64 },
    Circle { radius: f64 },
    Triangle { width: f64, height: f64 },
    Line { x2: f64, y2: f64 },
    Text { content: String, font_size: f64 },
}

impl ShapeGeometry {
    /// The kind this geometry belongs to.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Triangle { .. } => ShapeKind::Triangle,
            Self::Line { .. } => ShapeKind::Line,
            Self::Text { .. } => ShapeKind::Text,
        }
    }
}

// =============================================================================
// SHAPE SNAPSHOT
// =============================================================================

/// A shape as observed at one instant. Read-only for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSnapshot {
    /// Stable identifier.
    pub id: ShapeId,
    /// Optional user-visible display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Left/anchor x in world coordinates.
    pub x: f64,
    /// Top/anchor y in world coordinates.
    pub y: f64,
    /// Kind-dependent measurements.
    pub geometry: ShapeGeometry,
    /// Fill color as a hex string (e.g. `"#FF0000"`).
    pub color: String,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Clockwise rotation in degrees.
    pub rotation: f64,
    /// Stacking order; higher draws on top.
    pub z_index: i32,
    /// Hidden shapes still resolve and still occupy z slots.
    pub visible: bool,
    /// Locked shapes reject mutation.
    pub locked: bool,
}

impl ShapeSnapshot {
    /// Shape kind, derived from geometry.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    /// Horizontal extent: width for boxes, diameter for circles,
    /// endpoint span for lines, glyph-estimated width for text.
    #[must_use]
    pub fn extent_x(&self) -> f64 {
        match &self.geometry {
            ShapeGeometry::Rectangle { width, .. } | ShapeGeometry::Triangle { width, .. } => *width,
            ShapeGeometry::Circle { radius } => 2.0 * radius,
            ShapeGeometry::Line { x2, .. } => (x2 - self.x).abs(),
            ShapeGeometry::Text { content, font_size } => {
                #[allow(clippy::cast_precision_loss)]
                let glyphs = content.chars().count() as f64;
                glyphs * font_size * TEXT_GLYPH_ASPECT
            }
        }
    }

    /// Vertical extent, symmetric to [`Self::extent_x`].
    #[must_use]
    pub fn extent_y(&self) -> f64 {
        match &self.geometry {
            ShapeGeometry::Rectangle { height, .. } | ShapeGeometry::Triangle { height, .. } => *height,
            ShapeGeometry::Circle { radius } => 2.0 * radius,
            ShapeGeometry::Line { y2, .. } => (y2 - self.y).abs(),
            ShapeGeometry::Text { font_size, .. } => font_size * TEXT_LINE_HEIGHT,
        }
    }
}

// =============================================================================
// SPARSE UPDATE
// =============================================================================

/// Sparse update for a shape. Only present fields are applied; fields that
/// don't apply to the target's geometry are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl ShapePatch {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// =============================================================================
// DOCUMENT SNAPSHOT
// =============================================================================

/// Camera state: pan offset plus zoom scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    /// Zoom factor; must be positive.
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, scale: 1.0 }
    }
}

/// Extent of the drawing surface in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasBounds {
    fn default() -> Self {
        Self { width: 1920.0, height: 1080.0 }
    }
}

/// Read-only view of the whole document at one instant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// All shapes keyed by id; map order is meaningless.
    pub shapes: HashMap<ShapeId, ShapeSnapshot>,
    pub viewport: Viewport,
    pub canvas: CanvasBounds,
    /// Currently selected shape ids.
    pub selection: HashSet<ShapeId>,
}

impl DocumentSnapshot {
    /// Look up a shape by id.
    #[must_use]
    pub fn get(&self, id: &ShapeId) -> Option<&ShapeSnapshot> {
        self.shapes.get(id)
    }

    /// All shapes in stable document order: ascending `(z_index, id)`.
    #[must_use]
    pub fn ordered_shapes(&self) -> Vec<&ShapeSnapshot> {
        let mut shapes: Vec<&ShapeSnapshot> = self.shapes.values().collect();
        shapes.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        shapes
    }

    /// Highest z-index in the document, or 0 when empty.
    #[must_use]
    pub fn max_z_index(&self) -> i32 {
        self.shapes.values().map(|s| s.z_index).max().unwrap_or(0)
    }

    /// Number of shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// True when the document holds no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// A rectangle with the given color at a position; z assigned by caller.
    #[must_use]
    pub fn rect(name: Option<&str>, color: &str, z_index: i32) -> ShapeSnapshot {
        ShapeSnapshot {
            id: Uuid::new_v4(),
            name: name.map(str::to_string),
            x: 0.0,
            y: 0.0,
            geometry: ShapeGeometry::Rectangle { width: 100.0, height: 50.0 },
            color: color.to_string(),
            opacity: 1.0,
            rotation: 0.0,
            z_index,
            visible: true,
            locked: false,
        }
    }

    /// A circle with the given color.
    #[must_use]
    pub fn circle(name: Option<&str>, color: &str, z_index: i32) -> ShapeSnapshot {
        ShapeSnapshot {
            geometry: ShapeGeometry::Circle { radius: 25.0 },
            ..rect(name, color, z_index)
        }
    }

    /// Snapshot built from a list of shapes, empty selection.
    #[must_use]
    pub fn snapshot_of(shapes: Vec<ShapeSnapshot>) -> DocumentSnapshot {
        let mut doc = DocumentSnapshot::default();
        for shape in shapes {
            doc.shapes.insert(shape.id, shape);
        }
        doc
    }
}
