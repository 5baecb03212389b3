//! Shape resolution — symbolic references to canonical ids.
//!
//! DESIGN
//! ======
//! A reference like `"the blue circle"` arrives as free text from the
//! reasoning service. Strategies run in order, first success wins:
//! exact id, exact name, case-insensitive name, color+kind fuzzy,
//! color-only, kind-only. Fuzzy ambiguity is non-fatal: the first shape
//! in stable document order wins and the result is flagged so callers
//! can log it. All strategies read one immutable snapshot; nothing here
//! mutates the document.

#[cfg(test)]
#[path = "resolver_test.rs"]
mod resolver_test;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::color::{ColorFamily, classify_hex};
use crate::document::{DocumentSnapshot, ShapeId, ShapeKind, ShapeSnapshot};
use crate::error::ErrorCode;

// =============================================================================
// TYPES
// =============================================================================

/// A successful resolution. `ambiguous` marks fuzzy matches that had more
/// than one candidate; the first in document order was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub id: ShapeId,
    pub ambiguous: bool,
}

/// Compact shape description carried in diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: ShapeId,
    pub kind: ShapeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub color: String,
}

impl From<&ShapeSnapshot> for Candidate {
    fn from(shape: &ShapeSnapshot) -> Self {
        Self { id: shape.id, kind: shape.kind(), name: shape.name.clone(), color: shape.color.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionError {
    /// Both a color and a kind token were recognized but nothing matched.
    #[error("no {family} {kind} found")]
    NotFound { family: ColorFamily, kind: ShapeKind },
    /// No strategy produced a unique answer.
    #[error("cannot resolve \"{identifier}\" against {count} shapes", count = candidates.len())]
    NotResolvable { identifier: String, candidates: Vec<Candidate> },
}

impl ErrorCode for ResolutionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E_SHAPE_NOT_FOUND",
            Self::NotResolvable { .. } => "E_NOT_RESOLVABLE",
        }
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve a symbolic shape reference against a document snapshot.
///
/// # Errors
///
/// Returns [`ResolutionError::NotFound`] when both a color and a kind
/// token were present but no shape matches, and
/// [`ResolutionError::NotResolvable`] (with the full candidate list)
/// otherwise.
pub fn resolve(identifier: &str, doc: &DocumentSnapshot) -> Result<Resolution, ResolutionError> {
    // 1. Exact id.
    if let Ok(id) = identifier.trim().parse::<Uuid>() {
        if doc.shapes.contains_key(&id) {
            return Ok(Resolution { id, ambiguous: false });
        }
    }

    let ordered = doc.ordered_shapes();

    // 2. Exact name.
    if let Some(shape) = ordered.iter().find(|s| s.name.as_deref() == Some(identifier)) {
        return Ok(Resolution { id: shape.id, ambiguous: false });
    }

    // 3. Case-insensitive name.
    if let Some(shape) = ordered
        .iter()
        .find(|s| s.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(identifier)))
    {
        return Ok(Resolution { id: shape.id, ambiguous: false });
    }

    // 4-6. Fuzzy: scan the phrase for one color and one kind token.
    let family = scan_color_token(identifier);
    let kind = scan_kind_token(identifier);

    if let (Some(family), Some(kind)) = (family, kind) {
        let candidates: Vec<&ShapeSnapshot> = ordered
            .iter()
            .copied()
            .filter(|s| s.kind() == kind && classify_hex(&s.color) == Some(family))
            .collect();
        return match candidates.as_slice() {
            [] => Err(ResolutionError::NotFound { family, kind }),
            [only] => Ok(Resolution { id: only.id, ambiguous: false }),
            [first, ..] => {
                warn!(
                    identifier,
                    %family,
                    %kind,
                    candidates = candidates.len(),
                    chosen = %first.id,
                    "ambiguous fuzzy reference, using first in document order"
                );
                Ok(Resolution { id: first.id, ambiguous: true })
            }
        };
    }

    // 5. Color-only: accepted only when exactly one shape matches.
    if let (Some(family), None) = (family, kind) {
        let mut matches = ordered.iter().filter(|s| classify_hex(&s.color) == Some(family));
        if let (Some(only), None) = (matches.next(), matches.next()) {
            return Ok(Resolution { id: only.id, ambiguous: false });
        }
    }

    // 6. Kind-only: accepted only when exactly one shape of the kind exists.
    if let (None, Some(kind)) = (family, kind) {
        let mut matches = ordered.iter().filter(|s| s.kind() == kind);
        if let (Some(only), None) = (matches.next(), matches.next()) {
            return Ok(Resolution { id: only.id, ambiguous: false });
        }
    }

    // 7. Out of strategies.
    Err(ResolutionError::NotResolvable {
        identifier: identifier.to_string(),
        candidates: ordered.iter().map(|s| Candidate::from(*s)).collect(),
    })
}

// =============================================================================
// TOKEN SCANNING
// =============================================================================

fn tokens(identifier: &str) -> impl Iterator<Item = String> + '_ {
    identifier
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
}

/// First recognized color-family token in the phrase.
fn scan_color_token(identifier: &str) -> Option<ColorFamily> {
    tokens(identifier).find_map(|t| ColorFamily::from_token(&t))
}

/// First recognized kind token in the phrase. `"square"` is a rectangle.
fn scan_kind_token(identifier: &str) -> Option<ShapeKind> {
    tokens(identifier).find_map(|t| match t.as_str() {
        "rectangle" | "square" => Some(ShapeKind::Rectangle),
        "circle" => Some(ShapeKind::Circle),
        "triangle" => Some(ShapeKind::Triangle),
        "line" => Some(ShapeKind::Line),
        "text" => Some(ShapeKind::Text),
        _ => None,
    })
}
