//! Notification endpoints.

use super::http::{ApiClient, take_field};
use super::types::{EntityId, Notification};
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct NotificationService {
    api: ApiClient,
}

impl NotificationService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /notifications`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `notifications` envelope.
    pub async fn list(&self) -> Result<Vec<Notification>, ApiError> {
        self.api
            .get("/notifications")
            .await
            .and_then(|body| take_field(body, "notifications"))
            .inspect_err(|e| tracing::error!(error = %e, "fetching notifications failed"))
    }

    /// `GET /notifications/unread`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `notifications` envelope.
    pub async fn unread(&self) -> Result<Vec<Notification>, ApiError> {
        self.api
            .get("/notifications/unread")
            .await
            .and_then(|body| take_field(body, "notifications"))
            .inspect_err(|e| tracing::error!(error = %e, "fetching unread notifications failed"))
    }

    /// `PATCH /notifications/{id}/read`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `notification` envelope.
    pub async fn mark_read(&self, id: &EntityId) -> Result<Notification, ApiError> {
        self.api
            .patch::<()>(&format!("/notifications/{id}/read"), None)
            .await
            .and_then(|body| take_field(body, "notification"))
            .inspect_err(|e| tracing::error!(error = %e, %id, "marking notification read failed"))
    }

    /// `PATCH /notifications/read-all`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors.
    pub async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.api
            .patch::<()>("/notifications/read-all", None)
            .await
            .map(drop)
            .inspect_err(|e| tracing::error!(error = %e, "marking all notifications read failed"))
    }

    /// `DELETE /notifications/{id}`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors.
    pub async fn delete(&self, id: &EntityId) -> Result<(), ApiError> {
        self.api
            .delete::<()>(&format!("/notifications/{id}"), None)
            .await
            .map(drop)
            .inspect_err(|e| tracing::error!(error = %e, %id, "deleting notification failed"))
    }
}
