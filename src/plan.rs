//! Plans and typed operations produced by the reasoning service.
//!
//! DESIGN
//! ======
//! Operations are a closed `#[serde(tag = "op")]` enum with one fixed
//! payload per kind, dispatched by exhaustive match in the interpreter so
//! adding a kind is compile-time-checked. A plan either carries operations
//! or a clarification request, never both; that invariant is checked here
//! before anything executes. Argument validation is per-operation so a
//! malformed operation fails at its own index during execution.

#[cfg(test)]
#[path = "plan_test.rs"]
mod plan_test;

use serde::{Deserialize, Serialize};

use crate::document::{ShapeGeometry, ShapeKind};
use crate::error::ErrorCode;

/// Plans larger than this execute server-side.
pub const SERVER_EXECUTION_THRESHOLD: usize = 50;

/// Upper bound on `rows * cols` for a single grid operation.
pub const MAX_GRID_CELLS: u32 = 1000;

// =============================================================================
// VALIDATION ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("clarification plans must carry no operations (got {count})")]
    ClarificationWithOperations { count: usize },
    #[error("{field} must be finite")]
    NonFiniteArgument { field: &'static str },
    #[error("{field} must be positive")]
    NonPositiveDimension { field: &'static str },
    #[error("opacity {value} outside [0, 1]")]
    OpacityOutOfRange { value: f64 },
    #[error("color must not be empty")]
    EmptyColor,
    #[error("style update carries neither color nor opacity")]
    EmptyStyleUpdate,
    #[error("spacing {value} must not be negative")]
    NegativeSpacing { value: f64 },
    #[error("target list must not be empty")]
    EmptyTargets,
    #[error("grid of {cells} cells exceeds the {max}-cell limit")]
    GridTooLarge { cells: u32, max: u32 },
}

impl ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "E_EMPTY_PROMPT",
            Self::ClarificationWithOperations { .. } => "E_CLARIFICATION_CONFLICT",
            Self::NonFiniteArgument { .. } => "E_NON_FINITE",
            Self::NonPositiveDimension { .. } => "E_BAD_DIMENSION",
            Self::OpacityOutOfRange { .. } => "E_OPACITY_RANGE",
            Self::EmptyColor => "E_EMPTY_COLOR",
            Self::EmptyStyleUpdate => "E_EMPTY_STYLE",
            Self::NegativeSpacing { .. } => "E_NEGATIVE_SPACING",
            Self::EmptyTargets => "E_EMPTY_TARGETS",
            Self::GridTooLarge { .. } => "E_GRID_TOO_LARGE",
        }
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Axis for arrange layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// One typed mutation request. `target` fields are symbolic references
/// resolved against the live document at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateShape {
        x: f64,
        y: f64,
        geometry: ShapeGeometry,
        color: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opacity: Option<f64>,
    },
    Move {
        target: String,
        x: f64,
        y: f64,
    },
    Resize {
        target: String,
        width: f64,
        height: f64,
    },
    Rotate {
        target: String,
        degrees: f64,
    },
    UpdateStyle {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opacity: Option<f64>,
    },
    Arrange {
        targets: Vec<String>,
        direction: Direction,
        spacing: f64,
    },
    CreateGrid {
        rows: u32,
        cols: u32,
        cell_width: f64,
        cell_height: f64,
        spacing: f64,
        start_x: f64,
        start_y: f64,
        kind: ShapeKind,
        color: String,
        name_prefix: String,
    },
    BringToFront {
        target: String,
    },
    SendToBack {
        target: String,
    },
    Delete {
        target: String,
    },
    DeleteMultiple {
        targets: Vec<String>,
    },
    QueryState,
}

impl Operation {
    /// Wire name of the operation, for logs and progress reporting.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateShape { .. } => "create_shape",
            Self::Move { .. } => "move",
            Self::Resize { .. } => "resize",
            Self::Rotate { .. } => "rotate",
            Self::UpdateStyle { .. } => "update_style",
            Self::Arrange { .. } => "arrange",
            Self::CreateGrid { .. } => "create_grid",
            Self::BringToFront { .. } => "bring_to_front",
            Self::SendToBack { .. } => "send_to_back",
            Self::Delete { .. } => "delete",
            Self::DeleteMultiple { .. } => "delete_multiple",
            Self::QueryState => "query_state",
        }
    }

    /// Check the fixed argument schema for this operation.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::CreateShape { x, y, geometry, color, opacity, .. } => {
                finite(*x, "x")?;
                finite(*y, "y")?;
                validate_geometry(geometry)?;
                validate_color(color)?;
                validate_opacity(*opacity)
            }
            Self::Move { x, y, .. } => {
                finite(*x, "x")?;
                finite(*y, "y")
            }
            Self::Resize { width, height, .. } => {
                positive(*width, "width")?;
                positive(*height, "height")
            }
            Self::Rotate { degrees, .. } => finite(*degrees, "degrees"),
            Self::UpdateStyle { color, opacity, .. } => {
                if color.is_none() && opacity.is_none() {
                    return Err(ValidationError::EmptyStyleUpdate);
                }
                if let Some(color) = color {
                    validate_color(color)?;
                }
                validate_opacity(*opacity)
            }
            Self::Arrange { spacing, .. } => validate_spacing(*spacing),
            Self::CreateGrid { rows, cols, cell_width, cell_height, spacing, start_x, start_y, color, .. } => {
                if *rows == 0 {
                    return Err(ValidationError::NonPositiveDimension { field: "rows" });
                }
                if *cols == 0 {
                    return Err(ValidationError::NonPositiveDimension { field: "cols" });
                }
                let cells = rows.saturating_mul(*cols);
                if cells > MAX_GRID_CELLS {
                    return Err(ValidationError::GridTooLarge { cells, max: MAX_GRID_CELLS });
                }
                positive(*cell_width, "cell_width")?;
                positive(*cell_height, "cell_height")?;
                validate_spacing(*spacing)?;
                finite(*start_x, "start_x")?;
                finite(*start_y, "start_y")?;
                validate_color(color)
            }
            Self::DeleteMultiple { targets } => {
                if targets.is_empty() {
                    return Err(ValidationError::EmptyTargets);
                }
                Ok(())
            }
            Self::BringToFront { .. } | Self::SendToBack { .. } | Self::Delete { .. } | Self::QueryState => Ok(()),
        }
    }
}

fn finite(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteArgument { field })
    }
}

fn positive(value: f64, field: &'static str) -> Result<(), ValidationError> {
    finite(value, field)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveDimension { field })
    }
}

fn validate_spacing(value: f64) -> Result<(), ValidationError> {
    finite(value, "spacing")?;
    if value < 0.0 {
        return Err(ValidationError::NegativeSpacing { value });
    }
    Ok(())
}

fn validate_opacity(opacity: Option<f64>) -> Result<(), ValidationError> {
    match opacity {
        Some(value) if !(0.0..=1.0).contains(&value) => Err(ValidationError::OpacityOutOfRange { value }),
        _ => Ok(()),
    }
}

fn validate_color(color: &str) -> Result<(), ValidationError> {
    if color.trim().is_empty() {
        return Err(ValidationError::EmptyColor);
    }
    Ok(())
}

fn validate_geometry(geometry: &ShapeGeometry) -> Result<(), ValidationError> {
    match geometry {
        ShapeGeometry::Rectangle { width, height } | ShapeGeometry::Triangle { width, height } => {
            positive(*width, "width")?;
            positive(*height, "height")
        }
        ShapeGeometry::Circle { radius } => positive(*radius, "radius"),
        ShapeGeometry::Line { x2, y2 } => {
            finite(*x2, "x2")?;
            finite(*y2, "y2")
        }
        ShapeGeometry::Text { font_size, .. } => positive(*font_size, "font_size"),
    }
}

// =============================================================================
// PLAN
// =============================================================================

/// A question the reasoning service wants answered before planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clarification {
    pub question: String,
    pub options: Vec<String>,
}

/// Ordered operations for one user instruction, or a clarification request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Wire name matches the reasoning-service response field.
    #[serde(
        default,
        rename = "needs_clarification",
        skip_serializing_if = "Option::is_none"
    )]
    pub clarification: Option<Clarification>,
}

impl Plan {
    /// Enforce the plan-level invariant: a clarification plan executes
    /// nothing, so it must carry no operations.
    ///
    /// # Errors
    ///
    /// Returns `ClarificationWithOperations` when both are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.clarification.is_some() && !self.operations.is_empty() {
            return Err(ValidationError::ClarificationWithOperations { count: self.operations.len() });
        }
        Ok(())
    }

    /// Whether this plan should run server-side: oversized plans and
    /// anything containing a grid.
    #[must_use]
    pub fn prefers_server_execution(&self) -> bool {
        self.operations.len() > SERVER_EXECUTION_THRESHOLD
            || self
                .operations
                .iter()
                .any(|op| matches!(op, Operation::CreateGrid { .. }))
    }
}
