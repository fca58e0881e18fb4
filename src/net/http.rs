//! Intercepting HTTP client shared by every service.
//!
//! ARCHITECTURE
//! ============
//! Requests pick up `Authorization: Bearer <token>` from the
//! [`SessionContext`] at send time, so a token cleared by one response is
//! never attached to the next request. Error responses are logged and, for
//! auth-failure statuses, tear the session down before the error is handed
//! back to the caller.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is returned as an [`ApiError`]; nothing is swallowed here.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::SessionContext;

/// Whether an auth-failure status tears the session down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnAuthFailure {
    Teardown,
    /// The caller owns the teardown, as logout does.
    Return,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl ApiClient {
    /// Build a client for `config.base_url` bound to `session`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if reqwest rejects the settings.
    pub fn new(config: &ClientConfig, session: Arc<SessionContext>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned(), session })
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET path`, returning the decoded JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.send(self.request(Method::GET, path), &Method::GET, path, OnAuthFailure::Teardown).await
    }

    /// `GET path?query`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get_with_query<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<Value, ApiError> {
        self.send(self.request(Method::GET, path).query(query), &Method::GET, path, OnAuthFailure::Teardown).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.send(self.request(Method::POST, path).json(body), &Method::POST, path, OnAuthFailure::Teardown).await
    }

    /// `POST path` without a body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post_empty(&self, path: &str) -> Result<Value, ApiError> {
        self.send(self.request(Method::POST, path), &Method::POST, path, OnAuthFailure::Teardown).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.send(self.request(Method::PUT, path).json(body), &Method::PUT, path, OnAuthFailure::Teardown).await
    }

    /// `PATCH path`, with a JSON body when one is given.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<Value, ApiError> {
        let mut builder = self.request(Method::PATCH, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder, &Method::PATCH, path, OnAuthFailure::Teardown).await
    }

    /// `DELETE path`, with a JSON body when one is given.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<Value, ApiError> {
        let mut builder = self.request(Method::DELETE, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder, &Method::DELETE, path, OnAuthFailure::Teardown).await
    }

    /// `POST path` without a body, leaving a 401/403 to the caller.
    pub(crate) async fn post_empty_owning_teardown(&self, path: &str) -> Result<Value, ApiError> {
        self.send(self.request(Method::POST, path), &Method::POST, path, OnAuthFailure::Return).await
    }

    /// Request interception: resolve the URL and attach the session's
    /// bearer header, if any.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match self.session.authorization_for_request() {
            Some(auth) => builder.header(AUTHORIZATION, auth),
            None => builder,
        }
    }

    /// Response interception.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Network`] when no response arrives or the body cannot be read.
    /// - [`ApiError::Status`] for non-2xx responses; auth-failure statuses
    ///   clear the session first unless `on_auth_failure` says otherwise.
    async fn send(
        &self,
        builder: RequestBuilder,
        method: &Method,
        path: &str,
        on_auth_failure: OnAuthFailure,
    ) -> Result<Value, ApiError> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, %method, %path, "API request failed");
            ApiError::Network(e)
        })?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| {
            tracing::error!(error = %e, %method, %path, status, "API response body read failed");
            ApiError::Network(e)
        })?;
        let body = parse_body(&bytes);

        if (200..300).contains(&status) {
            return Ok(body);
        }

        let message = server_message(&body);
        tracing::error!(
            %method,
            %path,
            status,
            message = message.as_deref().unwrap_or_default(),
            "API error response"
        );
        if on_auth_failure == OnAuthFailure::Teardown && self.session.policy().is_auth_failure(status) {
            self.session.invalidate(status);
        }
        Err(ApiError::Status { status, message, body })
    }
}

/// Deserialize `body.<field>` into `T`.
///
/// # Errors
///
/// [`ApiError::MissingField`] if absent, [`ApiError::Decode`] if malformed.
pub fn take_field<T: DeserializeOwned>(mut body: Value, field: &'static str) -> Result<T, ApiError> {
    let value = body
        .get_mut(field)
        .map(Value::take)
        .ok_or(ApiError::MissingField(field))?;
    Ok(serde_json::from_value(value)?)
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn server_message(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => map.get("message").and_then(Value::as_str).map(str::to_owned),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        _ => None,
    }
}
