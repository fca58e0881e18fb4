//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::error::ApiError;
use crate::session::AuthFailurePolicy;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub auth_failure: AuthFailurePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            auth_failure: AuthFailurePolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Build a config pointing at `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the URL is not `http://` or `https://`.
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self { base_url: normalize_base_url(base_url)?, ..Self::default() })
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `TASKBOARD_API_URL`: default `http://localhost:8000/api`
    /// - `TASKBOARD_TIMEOUT_SECS`: default 10
    /// - `TASKBOARD_CONNECT_TIMEOUT_SECS`: default 5
    /// - `TASKBOARD_REDIRECT_DELAY_MS`: default 100, `0` redirects immediately
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] for a malformed base URL.
    pub fn from_env() -> Result<Self, ApiError> {
        let raw_url = std::env::var("TASKBOARD_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let base_url = normalize_base_url(&raw_url)?;

        let request_timeout = Duration::from_secs(env_parse_u64("TASKBOARD_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS));
        let connect_timeout =
            Duration::from_secs(env_parse_u64("TASKBOARD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS));
        let auth_failure = AuthFailurePolicy {
            redirect_delay: Duration::from_millis(env_parse_u64(
                "TASKBOARD_REDIRECT_DELAY_MS",
                DEFAULT_REDIRECT_DELAY_MS,
            )),
            ..AuthFailurePolicy::default()
        };

        Ok(Self { base_url, request_timeout, connect_timeout, auth_failure })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_base_url(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ApiError::Config(format!("base URL must start with http:// or https://, got '{raw}'")));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
