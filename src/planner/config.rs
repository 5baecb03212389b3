//! Planner configuration parsed from environment variables.

use super::types::ServiceError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Base URL of the reasoning service, no trailing slash.
    pub base_url: String,
    /// Bearer token, when the deployment requires one.
    pub api_token: Option<String>,
    pub timeouts: PlannerTimeouts,
}

impl PlannerConfig {
    /// Build typed planner config from environment variables.
    ///
    /// Optional:
    /// - `PLANNER_BASE_URL`: default `http://localhost:3000`
    /// - `PLANNER_API_KEY_ENV`: names the env var containing the bearer
    ///   token; when set, that var must exist
    /// - `PLANNER_REQUEST_TIMEOUT_SECS`: default 120
    /// - `PLANNER_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` when `PLANNER_API_KEY_ENV` names an unset
    /// variable.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Env-free constructor used by `from_env` and tests.
    ///
    /// # Errors
    ///
    /// As [`Self::from_env`].
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ServiceError> {
        let base_url = get("PLANNER_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let api_token = match get("PLANNER_API_KEY_ENV") {
            Some(key_var) => {
                let token = get(&key_var).ok_or(ServiceError::MissingApiKey { var: key_var })?;
                Some(token)
            }
            None => None,
        };

        let timeouts = PlannerTimeouts {
            request_secs: parse_u64(&get, "PLANNER_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(&get, "PLANNER_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { base_url, api_token, timeouts })
    }
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    get(key).and_then(|v| v.parse::<u64>().ok()).unwrap_or(default)
}
