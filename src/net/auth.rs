//! Session service: login, registration, logout, refresh and profile fetch.
//!
//! ERROR HANDLING
//! ==============
//! Every operation logs its failure and returns it unchanged, except
//! [`AuthService::logout`], whose contract is "no longer authenticated on
//! this device" regardless of whether the server could be reached.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::http::{ApiClient, take_field};
use super::types::{AuthPayload, User};
use crate::error::ApiError;
use crate::session::{ClearReason, SessionContext};

const LOGIN_MISSING_TOKEN: &str = "Authentication failed: No token received";
const REGISTER_MISSING_TOKEN: &str = "Registration failed: No token received";
const REFRESH_MISSING_TOKEN: &str = "Token refresh failed: No token received";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionContext> {
        self.api.session()
    }

    /// `POST /auth/login`; persists the returned token.
    ///
    /// # Errors
    ///
    /// [`ApiError::MissingToken`] when the response has no token (nothing is
    /// persisted), otherwise the transport/HTTP error.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthPayload, ApiError> {
        self.authenticate("/auth/login", credentials, LOGIN_MISSING_TOKEN)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "login failed"))
    }

    /// `POST /auth/register`; persists the returned token.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::login`].
    pub async fn register(&self, registration: &Registration) -> Result<AuthPayload, ApiError> {
        self.authenticate("/auth/register", registration, REGISTER_MISSING_TOKEN)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "registration failed"))
    }

    async fn authenticate<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        missing_token: &'static str,
    ) -> Result<AuthPayload, ApiError> {
        let body = self.api.post(path, body).await?;
        self.accept_token(body, missing_token)
    }

    /// Persist the token carried by `body`, then decode the rest of it.
    ///
    /// The token is read before anything else so an unreadable `user` never
    /// costs the session.
    fn accept_token(&self, body: Value, missing_token: &'static str) -> Result<AuthPayload, ApiError> {
        let Some(token) = body.get("token").and_then(Value::as_str).filter(|t| !t.is_empty()) else {
            return Err(ApiError::MissingToken(missing_token));
        };
        self.session().establish(token)?;
        Ok(auth_payload(body))
    }

    /// Best-effort `POST /auth/logout`, then local teardown.
    ///
    /// The remote call is skipped when no token is persisted. Local cleanup
    /// runs exactly once, even if this future is dropped mid-request or the
    /// server rejects the stale token, and no login redirect is scheduled.
    pub async fn logout(&self) {
        let session = self.session();
        let _teardown = session.teardown(ClearReason::Logout);
        if !session.has_token() {
            tracing::debug!("no persisted token; skipping remote logout");
            return;
        }
        if let Err(e) = self.api.post_empty_owning_teardown("/auth/logout").await {
            tracing::warn!(error = %e, "remote logout failed; clearing local session anyway");
        }
    }

    /// `POST /auth/refresh-token`; persists the new token.
    ///
    /// # Errors
    ///
    /// Any failure (including a response without a token) clears the
    /// session once before the error is returned.
    pub async fn refresh_token(&self) -> Result<AuthPayload, ApiError> {
        self.request_refresh().await.inspect_err(|e| {
            tracing::error!(error = %e, "token refresh failed; ending session");
            if !self.cleared_by_interceptor(e) {
                self.session().clear(ClearReason::RefreshFailed);
            }
        })
    }

    fn cleared_by_interceptor(&self, error: &ApiError) -> bool {
        matches!(error, ApiError::Status { status, .. } if self.session().policy().is_auth_failure(*status))
    }

    async fn request_refresh(&self) -> Result<AuthPayload, ApiError> {
        let body = self.api.post_empty("/auth/refresh-token").await?;
        self.accept_token(body, REFRESH_MISSING_TOKEN)
    }

    /// `GET /auth/me`. A failure here does not clear the token by itself.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors, or [`ApiError::MissingField`] without `user`.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.api
            .get("/auth/me")
            .await
            .and_then(|body| take_field(body, "user"))
            .inspect_err(|e| tracing::error!(error = %e, "fetching current user failed"))
    }

    /// Whether a token is persisted (backfills the default header).
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }
}

/// Split an auth response into its parts. A `user` that does not decode is
/// logged and dropped.
fn auth_payload(body: Value) -> AuthPayload {
    let Value::Object(mut fields) = body else {
        return AuthPayload::default();
    };
    let token = fields.remove("token").and_then(|v| v.as_str().map(str::to_owned));
    let user = match fields.remove("user") {
        None | Some(Value::Null) => None,
        Some(raw) => serde_json::from_value(raw)
            .inspect_err(|e| tracing::warn!(error = %e, "auth response carried an unreadable user"))
            .ok(),
    };
    AuthPayload { token, user, extra: fields }
}
