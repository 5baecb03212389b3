//! The document-mutation surface the engine executes against.
//!
//! DESIGN
//! ======
//! The scene graph is owned elsewhere (a canvas frontend, a remote
//! document service); the engine only ever calls this trait. Keeping it
//! an `async_trait` object seam means tests drive the interpreter with
//! mocks and the shipped [`crate::store::DocumentStore`] is just one
//! implementation. `bulk_delete` takes the id list explicitly — deletion
//! never reads shared selection state, although callers still keep the
//! selection in sync for UI feedback.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{DocumentSnapshot, ShapeId, ShapePatch};
use crate::error::ErrorCode;
use crate::layers::LayerError;

// =============================================================================
// CREATION PARAMS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectangleParams {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleParams {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleParams {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineParams {
    pub x: f64,
    pub y: f64,
    pub x2: f64,
    pub y2: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextParams {
    pub x: f64,
    pub y: f64,
    pub content: String,
    pub font_size: f64,
    pub color: String,
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MutationError {
    #[error("shape not found: {0}")]
    NotFound(ShapeId),
    #[error("shape is locked: {0}")]
    Locked(ShapeId),
    #[error("layer index: {0}")]
    Layer(#[from] LayerError),
    /// The backing document implementation failed (transport, storage).
    #[error("document backend: {0}")]
    Backend(String),
}

impl ErrorCode for MutationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_SHAPE_NOT_FOUND",
            Self::Locked(_) => "E_SHAPE_LOCKED",
            Self::Layer(e) => e.error_code(),
            Self::Backend(_) => "E_DOCUMENT_BACKEND",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Async mutation API over the shared document. Creation calls return the
/// committed id synchronously; there is no settle delay to wait out.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn create_rectangle(&self, params: RectangleParams) -> Result<ShapeId, MutationError>;
    async fn create_circle(&self, params: CircleParams) -> Result<ShapeId, MutationError>;
    async fn create_triangle(&self, params: TriangleParams) -> Result<ShapeId, MutationError>;
    async fn create_line(&self, params: LineParams) -> Result<ShapeId, MutationError>;
    async fn create_text(&self, params: TextParams) -> Result<ShapeId, MutationError>;

    /// Apply a sparse update. Fields that don't fit the target's geometry
    /// are ignored.
    async fn update_shape(&self, id: ShapeId, patch: ShapePatch) -> Result<(), MutationError>;

    async fn delete_shape(&self, id: ShapeId) -> Result<(), MutationError>;

    /// Delete every listed shape in one call. The id list is explicit;
    /// implementations must not consult the current selection.
    async fn bulk_delete(&self, ids: &[ShapeId]) -> Result<(), MutationError>;

    async fn bring_to_front(&self, id: ShapeId) -> Result<(), MutationError>;
    async fn send_to_back(&self, id: ShapeId) -> Result<(), MutationError>;

    async fn select_shape(&self, id: ShapeId) -> Result<(), MutationError>;
    async fn deselect_all(&self) -> Result<(), MutationError>;

    /// Read-only view of the document at this instant.
    async fn snapshot(&self) -> DocumentSnapshot;
}
