//! Structured error metadata shared by every error enum in the crate.
//!
//! DESIGN
//! ======
//! Each module owns its own `thiserror` enum; this trait layers a grepable
//! code and a retryable flag on top so callers can categorize failures
//! without matching on every concrete type. One categorized message per
//! terminal failure is the user-facing contract; verbose diagnostics stay
//! in history entry detail fields.

/// Grepable error code and retryable flag for categorized failures.
pub trait ErrorCode: std::fmt::Display {
    /// Stable `E_*` identifier for logs and history entries.
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request may succeed.
    fn retryable(&self) -> bool {
        false
    }
}
