//! Session-aware client for the Taskboard project/task REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` owns the bearer token and every read/write of it, `net` wraps
//! the REST endpoints on top of a single intercepting HTTP client, `state`
//! holds observable containers for view code, and `router` gates navigation
//! on the session.
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskboard_client::{ApiClient, ClientConfig, SessionContext};
//! use taskboard_client::net::auth::{AuthService, Credentials};
//! use taskboard_client::session::{LogNavigator, MemoryTokenStore};
//!
//! # async fn example() -> Result<(), taskboard_client::ApiError> {
//! let config = ClientConfig::from_env()?;
//! let session = Arc::new(SessionContext::new(
//!     Arc::new(MemoryTokenStore::default()),
//!     Arc::new(LogNavigator),
//!     config.auth_failure.clone(),
//! ));
//! let api = ApiClient::new(&config, session)?;
//! let auth = AuthService::new(api);
//! auth.login(&Credentials::new("ada@example.com", "hunter2")).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod net;
pub mod router;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_helpers;

pub use config::ClientConfig;
pub use error::ApiError;
pub use net::http::ApiClient;
pub use session::{SessionContext, SessionEvent};
