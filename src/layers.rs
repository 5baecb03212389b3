//! Layer indexing — z-order maintenance over the shape collection.
//!
//! DESIGN
//! ======
//! Two update policies, both pure: `promote_to_front` jumps the target to
//! `max + 1` and touches nothing else; `set_explicit_z_index` shifts the
//! affected range by one so the total order stays strict with at most one
//! shape per affected integer. Functions return [`ZChange`] lists that the
//! store applies; keeping them pure makes ordering properties trivially
//! testable. `validate` is advisory only: gaps from deletions are
//! tolerated because every consumer sorts by `(z_index, id)`.

#[cfg(test)]
#[path = "layers_test.rs"]
mod layers_test;

use crate::document::{ShapeId, ShapeSnapshot};
use crate::error::ErrorCode;

// =============================================================================
// TYPES
// =============================================================================

/// One shape's new z-index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZChange {
    pub id: ShapeId,
    pub z_index: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LayerError {
    #[error("shape not found: {0}")]
    ShapeNotFound(ShapeId),
    #[error("z-index {0} is below the minimum of 1")]
    IndexOutOfRange(i32),
}

impl ErrorCode for LayerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ShapeNotFound(_) => "E_SHAPE_NOT_FOUND",
            Self::IndexOutOfRange(_) => "E_Z_INDEX_RANGE",
        }
    }
}

// =============================================================================
// UPDATE POLICIES
// =============================================================================

/// Move a shape to the front: `max + 1`, other shapes untouched.
/// Returns no changes when the shape already holds the maximum.
///
/// # Errors
///
/// Returns `ShapeNotFound` when `id` isn't in `shapes`.
pub fn promote_to_front(shapes: &[ShapeSnapshot], id: ShapeId) -> Result<Vec<ZChange>, LayerError> {
    let target = shapes
        .iter()
        .find(|s| s.id == id)
        .ok_or(LayerError::ShapeNotFound(id))?;
    let max = shapes.iter().map(|s| s.z_index).max().unwrap_or(0);
    if target.z_index == max {
        return Ok(Vec::new());
    }
    Ok(vec![ZChange { id, z_index: max + 1 }])
}

/// Reposition a shape to an explicit z-index, shifting the affected range
/// by one so every other shape keeps its relative order.
///
/// Moving forward (`new_z > old`): shapes with `old < z ≤ new_z` step
/// down. Moving backward (`new_z < old`): shapes with `new_z ≤ z < old`
/// step up. The target's change is always last in the returned list.
///
/// # Errors
///
/// Returns `IndexOutOfRange` when `new_z < 1` and `ShapeNotFound` when
/// `id` isn't in `shapes`.
pub fn set_explicit_z_index(shapes: &[ShapeSnapshot], id: ShapeId, new_z: i32) -> Result<Vec<ZChange>, LayerError> {
    if new_z < 1 {
        return Err(LayerError::IndexOutOfRange(new_z));
    }
    let old = shapes
        .iter()
        .find(|s| s.id == id)
        .map(|s| s.z_index)
        .ok_or(LayerError::ShapeNotFound(id))?;
    if new_z == old {
        return Ok(Vec::new());
    }

    let mut changes: Vec<ZChange> = shapes
        .iter()
        .filter(|s| s.id != id)
        .filter_map(|s| {
            let z = s.z_index;
            if new_z > old && z > old && z <= new_z {
                Some(ZChange { id: s.id, z_index: z - 1 })
            } else if new_z < old && z >= new_z && z < old {
                Some(ZChange { id: s.id, z_index: z + 1 })
            } else {
                None
            }
        })
        .collect();
    // Deterministic output regardless of input slice order.
    changes.sort_by_key(|c| (c.z_index, c.id));
    changes.push(ZChange { id, z_index: new_z });
    Ok(changes)
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Result of a z-order audit. Advisory: nothing renumbers automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerReport {
    /// z values held by more than one shape, ascending.
    pub duplicates: Vec<i32>,
    /// Integers absent from the contiguous range `[1, count]`, ascending.
    pub missing: Vec<i32>,
}

impl LayerReport {
    /// True when the z-order forms the dense range `[1, count]`.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.missing.is_empty()
    }
}

/// Audit the z-order for duplicates and gaps in `[1, count]`.
#[must_use]
pub fn validate(shapes: &[ShapeSnapshot]) -> LayerReport {
    let mut counts: std::collections::BTreeMap<i32, usize> = std::collections::BTreeMap::new();
    for shape in shapes {
        *counts.entry(shape.z_index).or_default() += 1;
    }

    let duplicates: Vec<i32> = counts
        .iter()
        .filter(|(_, n)| **n > 1)
        .map(|(z, _)| *z)
        .collect();

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let count = shapes.len() as i32;
    let missing: Vec<i32> = (1..=count).filter(|z| !counts.contains_key(z)).collect();

    LayerReport { duplicates, missing }
}
