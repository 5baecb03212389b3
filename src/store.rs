//! In-memory document store — the client-side [`DocumentApi`] backend.
//!
//! DESIGN
//! ======
//! Shapes, selection, and viewport live behind one `tokio::sync::RwLock`
//! so the store can be shared across await points. New shapes take
//! `z_index = max + 1`, keeping a strict total order without renumbering
//! survivors after deletions (gaps are tolerated; `layers::validate` can
//! audit them). Explicit z repositioning and front/back moves delegate to
//! the [`crate::layers`] policies. The store also tracks the bounded
//! recent-color list fed by create and style mutations.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::{
    CircleParams, DocumentApi, LineParams, MutationError, RectangleParams, TextParams, TriangleParams,
};
use crate::document::{
    CanvasBounds, DocumentSnapshot, ShapeGeometry, ShapeId, ShapePatch, ShapeSnapshot, Viewport,
};
use crate::layers;

/// Most recently used colors retained for palette suggestions.
pub const RECENT_COLORS_CAP: usize = 10;

// =============================================================================
// STORE
// =============================================================================

/// Owns the live shape collection. The engine reads snapshots and writes
/// only through the [`DocumentApi`] methods.
pub struct DocumentStore {
    inner: RwLock<StoreInner>,
}

struct StoreInner {
    doc: DocumentSnapshot,
    recent_colors: VecDeque<String>,
}

impl DocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner { doc: DocumentSnapshot::default(), recent_colors: VecDeque::new() }),
        }
    }

    /// Replace the whole document, e.g. when loading a saved board.
    pub async fn load(&self, shapes: Vec<ShapeSnapshot>, viewport: Viewport, canvas: CanvasBounds) {
        let mut inner = self.inner.write().await;
        inner.doc.shapes.clear();
        inner.doc.selection.clear();
        for shape in shapes {
            inner.doc.shapes.insert(shape.id, shape);
        }
        inner.doc.viewport = viewport;
        inner.doc.canvas = canvas;
    }

    /// Insert one shape verbatim, replacing any shape with the same id.
    pub async fn insert(&self, shape: ShapeSnapshot) {
        let mut inner = self.inner.write().await;
        inner.doc.shapes.insert(shape.id, shape);
    }

    /// Most-recent-first color list, deduplicated, capped at
    /// [`RECENT_COLORS_CAP`].
    pub async fn recent_colors(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        inner.recent_colors.iter().cloned().collect()
    }

    async fn insert_new(&self, x: f64, y: f64, geometry: ShapeGeometry, color: String) -> ShapeId {
        let mut inner = self.inner.write().await;
        let z_index = inner.doc.max_z_index() + 1;
        let id = Uuid::new_v4();
        let shape = ShapeSnapshot {
            id,
            name: None,
            x,
            y,
            geometry,
            color: color.clone(),
            opacity: 1.0,
            rotation: 0.0,
            z_index,
            visible: true,
            locked: false,
        };
        debug!(%id, kind = %shape.kind(), z_index, "store: shape created");
        inner.doc.shapes.insert(id, shape);
        push_recent_color(&mut inner.recent_colors, color);
        id
    }

    async fn apply_z_changes(&self, changes: Vec<layers::ZChange>) {
        let mut inner = self.inner.write().await;
        for change in changes {
            if let Some(shape) = inner.doc.shapes.get_mut(&change.id) {
                shape.z_index = change.z_index;
            }
        }
    }

    async fn shapes_vec(&self) -> Vec<ShapeSnapshot> {
        let inner = self.inner.read().await;
        inner.doc.shapes.values().cloned().collect()
    }

    async fn ensure_unlocked(&self, id: ShapeId) -> Result<(), MutationError> {
        let inner = self.inner.read().await;
        let shape = inner.doc.shapes.get(&id).ok_or(MutationError::NotFound(id))?;
        if shape.locked {
            return Err(MutationError::Locked(id));
        }
        Ok(())
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn push_recent_color(recent: &mut VecDeque<String>, color: String) {
    recent.retain(|c| c != &color);
    recent.push_front(color);
    recent.truncate(RECENT_COLORS_CAP);
}

/// Apply a sparse patch in place. Geometry fields that don't fit the
/// shape's kind are ignored.
fn apply_patch(shape: &mut ShapeSnapshot, patch: &ShapePatch) {
    if let Some(x) = patch.x {
        shape.x = x;
    }
    if let Some(y) = patch.y {
        shape.y = y;
    }
    match &mut shape.geometry {
        ShapeGeometry::Rectangle { width, height } | ShapeGeometry::Triangle { width, height } => {
            if let Some(w) = patch.width {
                *width = w;
            }
            if let Some(h) = patch.height {
                *height = h;
            }
        }
        ShapeGeometry::Circle { radius } => {
            if let Some(r) = patch.radius {
                *radius = r;
            }
        }
        ShapeGeometry::Line { x2, y2 } => {
            if let Some(v) = patch.x2 {
                *x2 = v;
            }
            if let Some(v) = patch.y2 {
                *y2 = v;
            }
        }
        ShapeGeometry::Text { font_size, .. } => {
            if let Some(v) = patch.font_size {
                *font_size = v;
            }
        }
    }
    if let Some(rotation) = patch.rotation {
        shape.rotation = rotation;
    }
    if let Some(opacity) = patch.opacity {
        shape.opacity = opacity;
    }
    if let Some(color) = &patch.color {
        shape.color.clone_from(color);
    }
    if let Some(name) = &patch.name {
        shape.name = Some(name.clone());
    }
    if let Some(visible) = patch.visible {
        shape.visible = visible;
    }
    if let Some(locked) = patch.locked {
        shape.locked = locked;
    }
}

// =============================================================================
// DOCUMENT API
// =============================================================================

#[async_trait]
impl DocumentApi for DocumentStore {
    async fn create_rectangle(&self, p: RectangleParams) -> Result<ShapeId, MutationError> {
        Ok(self
            .insert_new(p.x, p.y, ShapeGeometry::Rectangle { width: p.width, height: p.height }, p.color)
            .await)
    }

    async fn create_circle(&self, p: CircleParams) -> Result<ShapeId, MutationError> {
        Ok(self
            .insert_new(p.x, p.y, ShapeGeometry::Circle { radius: p.radius }, p.color)
            .await)
    }

    async fn create_triangle(&self, p: TriangleParams) -> Result<ShapeId, MutationError> {
        Ok(self
            .insert_new(p.x, p.y, ShapeGeometry::Triangle { width: p.width, height: p.height }, p.color)
            .await)
    }

    async fn create_line(&self, p: LineParams) -> Result<ShapeId, MutationError> {
        Ok(self
            .insert_new(p.x, p.y, ShapeGeometry::Line { x2: p.x2, y2: p.y2 }, p.color)
            .await)
    }

    async fn create_text(&self, p: TextParams) -> Result<ShapeId, MutationError> {
        Ok(self
            .insert_new(
                p.x,
                p.y,
                ShapeGeometry::Text { content: p.content, font_size: p.font_size },
                p.color,
            )
            .await)
    }

    async fn update_shape(&self, id: ShapeId, patch: ShapePatch) -> Result<(), MutationError> {
        // Explicit z moves shift neighbors; compute against a stable view
        // before taking the write lock.
        let z_changes = match patch.z_index {
            Some(new_z) => {
                let shapes = self.shapes_vec().await;
                Some(layers::set_explicit_z_index(&shapes, id, new_z)?)
            }
            None => None,
        };

        let mut inner = self.inner.write().await;
        let shape = inner.doc.shapes.get_mut(&id).ok_or(MutationError::NotFound(id))?;
        // Locked shapes accept only an unlock.
        if shape.locked && patch.locked != Some(false) {
            return Err(MutationError::Locked(id));
        }
        apply_patch(shape, &patch);
        if let Some(color) = patch.color.clone() {
            push_recent_color(&mut inner.recent_colors, color);
        }
        if let Some(changes) = z_changes {
            for change in changes {
                if let Some(shape) = inner.doc.shapes.get_mut(&change.id) {
                    shape.z_index = change.z_index;
                }
            }
        }
        Ok(())
    }

    async fn delete_shape(&self, id: ShapeId) -> Result<(), MutationError> {
        let mut inner = self.inner.write().await;
        let shape = inner.doc.shapes.get(&id).ok_or(MutationError::NotFound(id))?;
        if shape.locked {
            return Err(MutationError::Locked(id));
        }
        inner.doc.shapes.remove(&id);
        inner.doc.selection.remove(&id);
        Ok(())
    }

    async fn bulk_delete(&self, ids: &[ShapeId]) -> Result<(), MutationError> {
        let mut inner = self.inner.write().await;
        for id in ids {
            match inner.doc.shapes.get(id) {
                Some(shape) if shape.locked => {
                    warn!(%id, "store: bulk delete skipping locked shape");
                }
                Some(_) => {
                    inner.doc.shapes.remove(id);
                    inner.doc.selection.remove(id);
                }
                None => {}
            }
        }
        Ok(())
    }

    async fn bring_to_front(&self, id: ShapeId) -> Result<(), MutationError> {
        self.ensure_unlocked(id).await?;
        let shapes = self.shapes_vec().await;
        let changes = layers::promote_to_front(&shapes, id)?;
        self.apply_z_changes(changes).await;
        Ok(())
    }

    async fn send_to_back(&self, id: ShapeId) -> Result<(), MutationError> {
        self.ensure_unlocked(id).await?;
        let shapes = self.shapes_vec().await;
        let changes = layers::set_explicit_z_index(&shapes, id, 1)?;
        self.apply_z_changes(changes).await;
        Ok(())
    }

    async fn select_shape(&self, id: ShapeId) -> Result<(), MutationError> {
        let mut inner = self.inner.write().await;
        if !inner.doc.shapes.contains_key(&id) {
            return Err(MutationError::NotFound(id));
        }
        inner.doc.selection.insert(id);
        Ok(())
    }

    async fn deselect_all(&self) -> Result<(), MutationError> {
        let mut inner = self.inner.write().await;
        inner.doc.selection.clear();
        Ok(())
    }

    async fn snapshot(&self) -> DocumentSnapshot {
        let inner = self.inner.read().await;
        inner.doc.clone()
    }
}
