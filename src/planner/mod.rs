//! Reasoning-service client — natural language in, typed plans out.
//!
//! DESIGN
//! ======
//! The reasoning service is an external collaborator reached over HTTP.
//! [`PlanService`] is the trait seam the orchestrator depends on, so
//! tests drive the whole command lifecycle with mocks. The shipped
//! [`ReasoningClient`] is a thin `reqwest` wrapper: one endpoint, a
//! `mode` field choosing plan-only or server-side execution, pure
//! response parsing, and typed config from environment variables.

pub mod config;
pub mod http;
pub mod types;

pub use config::{PlannerConfig, PlannerTimeouts};
pub use http::ReasoningClient;
pub use types::{PlanService, RemoteExecutionSummary, RequestMode, ServiceError};
