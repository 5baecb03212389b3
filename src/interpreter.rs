//! Operation interpreter — typed plan operations to mutation calls.
//!
//! DESIGN
//! ======
//! Operations run strictly in order. A fresh snapshot is taken before each
//! resolution so ids minted earlier in the same plan are observable to
//! later operations. Progress fires synchronously after each completed
//! operation, never concurrently with one. The first error aborts the
//! rest (fail-fast, no rollback); [`ExecutionError`] carries the 0-based
//! failing index and the partial [`ExecutionReport`] so callers can
//! record exactly what was applied.

#[cfg(test)]
#[path = "interpreter_test.rs"]
mod interpreter_test;

use tracing::{debug, info, warn};

use crate::api::{
    CircleParams, DocumentApi, LineParams, MutationError, RectangleParams, TextParams, TriangleParams,
};
use crate::document::{ShapeGeometry, ShapeId, ShapeKind, ShapePatch, ShapeSnapshot};
use crate::error::ErrorCode;
use crate::plan::{Direction, Operation, ValidationError};
use crate::resolver::{self, ResolutionError};

// =============================================================================
// PROGRESS
// =============================================================================

/// Receives `(current, total, operation)` after each completed operation.
pub trait ProgressSink {
    fn on_progress(&mut self, current: usize, total: usize, operation: &Operation);
}

impl<F: FnMut(usize, usize, &Operation)> ProgressSink for F {
    fn on_progress(&mut self, current: usize, total: usize, operation: &Operation) {
        self(current, total, operation);
    }
}

// =============================================================================
// REPORT & ERRORS
// =============================================================================

/// Ledger of one execution run. Id lists are deduplicated and keep
/// first-touch order; `created` is creation order (row-major for grids).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionReport {
    /// Operations that ran to completion.
    pub executed: usize,
    pub created: Vec<ShapeId>,
    pub modified: Vec<ShapeId>,
    pub deleted: Vec<ShapeId>,
}

impl ExecutionReport {
    fn record_modified(&mut self, id: ShapeId) {
        if !self.modified.contains(&id) {
            self.modified.push(id);
        }
    }
}

/// Why a single operation failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
}

impl ErrorCode for OperationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Resolution(e) => e.error_code(),
            Self::Mutation(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Validation(e) => e.retryable(),
            Self::Resolution(e) => e.retryable(),
            Self::Mutation(e) => e.retryable(),
        }
    }
}

/// Fail-fast execution failure: the failing operation plus everything
/// that had already been applied (nothing is rolled back).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("operation {index} ({operation}) failed: {source}")]
pub struct ExecutionError {
    /// 0-based index of the failing operation.
    pub index: usize,
    /// Wire name of the failing operation.
    pub operation: &'static str,
    #[source]
    pub source: OperationError,
    /// State of the ledger when the failure hit.
    pub report: ExecutionReport,
}

impl ErrorCode for ExecutionError {
    fn error_code(&self) -> &'static str {
        self.source.error_code()
    }

    fn retryable(&self) -> bool {
        self.source.retryable()
    }
}

// =============================================================================
// INTERPRETER
// =============================================================================

/// Executes plan operations against a [`DocumentApi`].
pub struct OperationInterpreter<'a> {
    api: &'a dyn DocumentApi,
}

impl<'a> OperationInterpreter<'a> {
    #[must_use]
    pub fn new(api: &'a dyn DocumentApi) -> Self {
        Self { api }
    }

    /// Run `operations` in order, reporting progress after each one.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] at the first failing operation; earlier
    /// mutations stay applied.
    pub async fn execute(
        &self,
        operations: &[Operation],
        progress: &mut dyn ProgressSink,
    ) -> Result<ExecutionReport, ExecutionError> {
        let total = operations.len();
        let mut report = ExecutionReport::default();

        for (index, operation) in operations.iter().enumerate() {
            debug!(index, total, op = operation.name(), "interpreter: dispatching");
            if let Err(source) = self.apply(operation, &mut report).await {
                warn!(
                    index,
                    op = operation.name(),
                    code = source.error_code(),
                    error = %source,
                    "interpreter: aborting plan"
                );
                return Err(ExecutionError { index, operation: operation.name(), source, report });
            }
            report.executed += 1;
            progress.on_progress(index + 1, total, operation);
        }

        info!(
            executed = report.executed,
            created = report.created.len(),
            modified = report.modified.len(),
            deleted = report.deleted.len(),
            "interpreter: plan complete"
        );
        Ok(report)
    }

    async fn apply(&self, operation: &Operation, report: &mut ExecutionReport) -> Result<(), OperationError> {
        operation.validate()?;

        match operation {
            Operation::CreateShape { x, y, geometry, color, name, opacity } => {
                let id = self.create(*x, *y, geometry, color).await?;
                // Name and opacity ride one follow-up metadata update.
                if name.is_some() || opacity.is_some() {
                    let patch = ShapePatch { name: name.clone(), opacity: *opacity, ..ShapePatch::default() };
                    self.api.update_shape(id, patch).await?;
                }
                report.created.push(id);
            }
            Operation::Move { target, x, y } => {
                let shape = self.resolve_shape(target).await?;
                self.api.update_shape(shape.id, translation_patch(&shape, *x, *y)).await?;
                report.record_modified(shape.id);
            }
            Operation::Resize { target, width, height } => {
                let shape = self.resolve_shape(target).await?;
                self.api
                    .update_shape(shape.id, resize_patch(&shape, *width, *height))
                    .await?;
                report.record_modified(shape.id);
            }
            Operation::Rotate { target, degrees } => {
                let id = self.resolve_id(target).await?;
                let patch = ShapePatch { rotation: Some(*degrees), ..ShapePatch::default() };
                self.api.update_shape(id, patch).await?;
                report.record_modified(id);
            }
            Operation::UpdateStyle { target, color, opacity } => {
                let id = self.resolve_id(target).await?;
                let patch = ShapePatch { color: color.clone(), opacity: *opacity, ..ShapePatch::default() };
                self.api.update_shape(id, patch).await?;
                report.record_modified(id);
            }
            Operation::Arrange { targets, direction, spacing } => {
                self.arrange(targets, *direction, *spacing, report).await?;
            }
            Operation::CreateGrid {
                rows,
                cols,
                cell_width,
                cell_height,
                spacing,
                start_x,
                start_y,
                kind,
                color,
                name_prefix,
            } => {
                self.create_grid(
                    *rows,
                    *cols,
                    *cell_width,
                    *cell_height,
                    *spacing,
                    *start_x,
                    *start_y,
                    *kind,
                    color,
                    name_prefix,
                    report,
                )
                .await?;
            }
            Operation::BringToFront { target } => {
                let id = self.resolve_id(target).await?;
                self.api.bring_to_front(id).await?;
                report.record_modified(id);
            }
            Operation::SendToBack { target } => {
                let id = self.resolve_id(target).await?;
                self.api.send_to_back(id).await?;
                report.record_modified(id);
            }
            Operation::Delete { target } => {
                let id = self.resolve_id(target).await?;
                self.api.delete_shape(id).await?;
                report.deleted.push(id);
            }
            Operation::DeleteMultiple { targets } => {
                self.delete_multiple(targets, report).await?;
            }
            Operation::QueryState => {
                let doc = self.api.snapshot().await;
                debug!(
                    shapes = doc.len(),
                    selected = doc.selection.len(),
                    "interpreter: query state"
                );
            }
        }
        Ok(())
    }

    /// Resolve against a fresh snapshot so ids minted earlier in the plan
    /// are visible.
    async fn resolve_id(&self, target: &str) -> Result<ShapeId, OperationError> {
        let doc = self.api.snapshot().await;
        Ok(resolver::resolve(target, &doc)?.id)
    }

    async fn resolve_shape(&self, target: &str) -> Result<ShapeSnapshot, OperationError> {
        let doc = self.api.snapshot().await;
        let id = resolver::resolve(target, &doc)?.id;
        // The id came out of this snapshot a moment ago.
        doc.get(&id)
            .cloned()
            .ok_or_else(|| OperationError::Mutation(MutationError::NotFound(id)))
    }

    async fn create(&self, x: f64, y: f64, geometry: &ShapeGeometry, color: &str) -> Result<ShapeId, OperationError> {
        let color = color.to_string();
        let id = match geometry {
            ShapeGeometry::Rectangle { width, height } => {
                self.api
                    .create_rectangle(RectangleParams { x, y, width: *width, height: *height, color })
                    .await?
            }
            ShapeGeometry::Circle { radius } => {
                self.api
                    .create_circle(CircleParams { x, y, radius: *radius, color })
                    .await?
            }
            ShapeGeometry::Triangle { width, height } => {
                self.api
                    .create_triangle(TriangleParams { x, y, width: *width, height: *height, color })
                    .await?
            }
            ShapeGeometry::Line { x2, y2 } => {
                self.api
                    .create_line(LineParams { x, y, x2: *x2, y2: *y2, color })
                    .await?
            }
            ShapeGeometry::Text { content, font_size } => {
                self.api
                    .create_text(TextParams { x, y, content: content.clone(), font_size: *font_size, color })
                    .await?
            }
        };
        Ok(id)
    }

    async fn arrange(
        &self,
        targets: &[String],
        direction: Direction,
        spacing: f64,
        report: &mut ExecutionReport,
    ) -> Result<(), OperationError> {
        // One snapshot for the whole layout: targets must already exist.
        let doc = self.api.snapshot().await;
        let mut shapes = Vec::with_capacity(targets.len());
        for target in targets {
            let id = resolver::resolve(target, &doc)?.id;
            let shape = doc
                .get(&id)
                .cloned()
                .ok_or(MutationError::NotFound(id))?;
            shapes.push(shape);
        }
        if shapes.len() < 2 {
            return Ok(());
        }

        // The first shape anchors the row/column and never moves.
        let first = &shapes[0];
        let mut cursor = match direction {
            Direction::Horizontal => first.x + first.extent_x() + spacing,
            Direction::Vertical => first.y + first.extent_y() + spacing,
        };
        for shape in &shapes[1..] {
            let (new_x, new_y) = match direction {
                Direction::Horizontal => (cursor, shape.y),
                Direction::Vertical => (shape.x, cursor),
            };
            self.api
                .update_shape(shape.id, translation_patch(shape, new_x, new_y))
                .await?;
            report.record_modified(shape.id);
            cursor += match direction {
                Direction::Horizontal => shape.extent_x() + spacing,
                Direction::Vertical => shape.extent_y() + spacing,
            };
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_grid(
        &self,
        rows: u32,
        cols: u32,
        cell_width: f64,
        cell_height: f64,
        spacing: f64,
        start_x: f64,
        start_y: f64,
        kind: ShapeKind,
        color: &str,
        name_prefix: &str,
        report: &mut ExecutionReport,
    ) -> Result<(), OperationError> {
        info!(rows, cols, kind = %kind, "interpreter: creating grid");
        for row in 0..rows {
            for col in 0..cols {
                let x = start_x + f64::from(col) * (cell_width + spacing);
                let y = start_y + f64::from(row) * (cell_height + spacing);
                let name = format!("{name_prefix} {}-{}", row + 1, col + 1);
                let geometry = cell_geometry(kind, cell_width, cell_height, x, y, &name);
                let id = self.create(x, y, &geometry, color).await?;
                self.api
                    .update_shape(id, ShapePatch { name: Some(name), ..ShapePatch::default() })
                    .await?;
                report.created.push(id);
            }
        }
        Ok(())
    }

    /// Clear the selection, select exactly the resolved targets, then
    /// issue one bulk delete carrying the explicit id list. The selection
    /// steps keep the UI honest about what is going away; deletion itself
    /// never reads selection state.
    async fn delete_multiple(&self, targets: &[String], report: &mut ExecutionReport) -> Result<(), OperationError> {
        let doc = self.api.snapshot().await;
        let mut ids = Vec::with_capacity(targets.len());
        for target in targets {
            let id = resolver::resolve(target, &doc)?.id;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        self.api.deselect_all().await?;
        for id in &ids {
            self.api.select_shape(*id).await?;
        }
        self.api.bulk_delete(&ids).await?;
        report.deleted.extend(ids);
        Ok(())
    }
}

// =============================================================================
// PATCH HELPERS
// =============================================================================

/// Move a shape to `(x, y)`, carrying line endpoints along so the
/// segment translates instead of stretching.
fn translation_patch(shape: &ShapeSnapshot, x: f64, y: f64) -> ShapePatch {
    let mut patch = ShapePatch { x: Some(x), y: Some(y), ..ShapePatch::default() };
    if let ShapeGeometry::Line { x2, y2 } = shape.geometry {
        patch.x2 = Some(x2 + (x - shape.x));
        patch.y2 = Some(y2 + (y - shape.y));
    }
    patch
}

/// Map a `width × height` resize onto the target's geometry.
fn resize_patch(shape: &ShapeSnapshot, width: f64, height: f64) -> ShapePatch {
    let mut patch = ShapePatch::default();
    match shape.geometry {
        ShapeGeometry::Rectangle { .. } | ShapeGeometry::Triangle { .. } => {
            patch.width = Some(width);
            patch.height = Some(height);
        }
        ShapeGeometry::Circle { .. } => {
            patch.radius = Some(width.min(height) / 2.0);
        }
        ShapeGeometry::Line { .. } => {
            patch.x2 = Some(shape.x + width);
            patch.y2 = Some(shape.y + height);
        }
        ShapeGeometry::Text { .. } => {
            patch.font_size = Some(height);
        }
    }
    patch
}

/// Geometry for one grid cell of the given kind.
fn cell_geometry(kind: ShapeKind, cell_width: f64, cell_height: f64, x: f64, y: f64, name: &str) -> ShapeGeometry {
    match kind {
        ShapeKind::Rectangle => ShapeGeometry::Rectangle { width: cell_width, height: cell_height },
        ShapeKind::Triangle => ShapeGeometry::Triangle { width: cell_width, height: cell_height },
        ShapeKind::Circle => ShapeGeometry::Circle { radius: cell_width.min(cell_height) / 2.0 },
        ShapeKind::Line => ShapeGeometry::Line { x2: x + cell_width, y2: y + cell_height },
        ShapeKind::Text => ShapeGeometry::Text { content: name.to_string(), font_size: cell_height },
    }
}
