//! HTTP client for the reasoning service.
//!
//! Thin `reqwest` wrapper for `POST /v1/commands`. Status mapping and
//! response parsing are pure functions for testability.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::config::PlannerConfig;
use super::types::{PlanRequest, PlanService, RemoteExecutionSummary, RequestMode, ServiceError};
use crate::document::DocumentSnapshot;
use crate::plan::Plan;

const COMMANDS_PATH: &str = "/v1/commands";

// =============================================================================
// CLIENT
// =============================================================================

pub struct ReasoningClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl ReasoningClient {
    /// Build a client from typed config.
    ///
    /// # Errors
    ///
    /// Returns `HttpClientBuild` when the underlying client can't be
    /// constructed.
    pub fn new(config: PlannerConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ServiceError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url, api_token: config.api_token })
    }

    /// Build a client from environment variables.
    ///
    /// # Errors
    ///
    /// Propagates config and client-build failures.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::new(PlannerConfig::from_env()?)
    }

    async fn send(
        &self,
        prompt: &str,
        document: &DocumentSnapshot,
        mode: RequestMode,
    ) -> Result<ParsedResponse, ServiceError> {
        let url = format!("{}{COMMANDS_PATH}", self.base_url);
        let body = PlanRequest { prompt, document, mode };

        let mut request = self.http.post(&url).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(map_error_status(status, text));
        }

        let parsed = parse_response(&text)?;
        info!(
            ?mode,
            operations = parsed.plan.operations.len(),
            clarification = parsed.plan.clarification.is_some(),
            "planner: response received"
        );
        Ok(parsed)
    }
}

#[async_trait]
impl PlanService for ReasoningClient {
    async fn request_plan(&self, prompt: &str, document: &DocumentSnapshot) -> Result<Plan, ServiceError> {
        Ok(self.send(prompt, document, RequestMode::Plan).await?.plan)
    }

    async fn execute_remote(
        &self,
        prompt: &str,
        document: &DocumentSnapshot,
    ) -> Result<RemoteExecutionSummary, ServiceError> {
        self.send(prompt, document, RequestMode::Execute)
            .await?
            .execution_summary
            .ok_or(ServiceError::MissingSummary)
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Decoded service response: the plan plus, for `mode: "execute"`, the
/// remote execution summary.
#[derive(Debug, Deserialize)]
pub(crate) struct ParsedResponse {
    #[serde(flatten)]
    pub plan: Plan,
    #[serde(default)]
    pub execution_summary: Option<RemoteExecutionSummary>,
}

pub(crate) fn parse_response(json: &str) -> Result<ParsedResponse, ServiceError> {
    serde_json::from_str(json).map_err(|e| ServiceError::Parse(e.to_string()))
}

/// Map a non-success HTTP status to the service error taxonomy.
pub(crate) fn map_error_status(status: u16, body: String) -> ServiceError {
    match status {
        401 | 403 => ServiceError::AuthRequired,
        429 => ServiceError::RateLimited,
        _ => ServiceError::Api { status, body },
    }
}
