//! Planner wire types, errors, and the service trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{DocumentSnapshot, ShapeId};
use crate::error::ErrorCode;
use crate::plan::Plan;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by reasoning-service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// A key env var was named but is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The service rejected the credentials (HTTP 401/403).
    #[error("authentication required")]
    AuthRequired,

    /// The service throttled us (HTTP 429).
    #[error("rate limited by the planning service")]
    RateLimited,

    /// The HTTP request itself failed (DNS, connect, timeout).
    #[error("plan request failed: {0}")]
    Request(String),

    /// The service returned a non-success HTTP status.
    #[error("plan response error: status {status}")]
    Api { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("plan response parse failed: {0}")]
    Parse(String),

    /// A server-side execution response carried no summary.
    #[error("server-side execution returned no summary")]
    MissingSummary,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for ServiceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::MissingApiKey { .. } => "E_MISSING_API_KEY",
            Self::AuthRequired => "E_AUTH_REQUIRED",
            Self::RateLimited => "E_RATE_LIMITED",
            Self::Request(_) => "E_API_REQUEST",
            Self::Api { .. } => "E_API_RESPONSE",
            Self::Parse(_) => "E_API_PARSE",
            Self::MissingSummary => "E_MISSING_SUMMARY",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Request(_) | Self::Api { status: 500..=599, .. }
        )
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// What the caller wants back: a plan to run locally, or server-side
/// application of the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    Plan,
    Execute,
}

/// Request body sent to the reasoning service.
#[derive(Debug, Serialize)]
pub struct PlanRequest<'a> {
    pub prompt: &'a str,
    pub document: &'a DocumentSnapshot,
    pub mode: RequestMode,
}

/// Summary returned by server-side execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteExecutionSummary {
    pub operations_applied: u32,
    pub shape_ids: Vec<ShapeId>,
    /// Milliseconds since Unix epoch, stamped by the service.
    pub timestamp: i64,
}

// =============================================================================
// SERVICE TRAIT
// =============================================================================

/// Provider-neutral async seam to the reasoning service. Enables mocking
/// in orchestrator tests.
#[async_trait]
pub trait PlanService: Send + Sync {
    /// Ask for a plan (`mode: "plan"`) for one instruction.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] on transport, auth, throttling, or
    /// malformed-response failures.
    async fn request_plan(&self, prompt: &str, document: &DocumentSnapshot) -> Result<Plan, ServiceError>;

    /// Ask the service to plan *and apply* the instruction remotely
    /// (`mode: "execute"`), returning its execution summary.
    ///
    /// # Errors
    ///
    /// As [`Self::request_plan`], plus [`ServiceError::MissingSummary`]
    /// when the response omits the summary.
    async fn execute_remote(
        &self,
        prompt: &str,
        document: &DocumentSnapshot,
    ) -> Result<RemoteExecutionSummary, ServiceError>;
}
