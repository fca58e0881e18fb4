//! Error taxonomy shared by the HTTP client, services and stores.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures, HTTP error statuses and application-level validation
//! failures (e.g. an auth response without a token) are distinct variants so
//! callers can react without string matching. Stores turn any of them into a
//! human-readable message via [`ApiError::user_message`].

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use std::path::PathBuf;

/// Failure reading or writing the persisted session token.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("token storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned by every client operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API responded with status {status}")]
    Status {
        status: u16,
        /// Server-provided `message` field, if the body carried one.
        message: Option<String>,
        body: serde_json::Value,
    },

    /// An auth response came back without a usable token.
    #[error("{0}")]
    MissingToken(&'static str),

    /// A response envelope lacked the expected field.
    #[error("response missing expected field `{0}`")]
    MissingField(&'static str),

    /// A response body or field could not be decoded.
    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// The persisted token could not be written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A configuration value was rejected.
    #[error("configuration error: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// HTTP status of the failed response, if there was one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message to show a user: the server's own `message` when present,
    /// otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status { message: Some(message), .. } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_owned(),
        }
    }
}
