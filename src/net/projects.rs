//! Project endpoints: CRUD plus membership.

use serde::Serialize;
use serde_json::json;

use super::http::{ApiClient, take_field};
use super::types::{EntityId, Member, Project};
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct ProjectService {
    api: ApiClient,
}

impl ProjectService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /projects`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `projects` envelope.
    pub async fn list(&self) -> Result<Vec<Project>, ApiError> {
        self.api
            .get("/projects")
            .await
            .and_then(|body| take_field(body, "projects"))
            .inspect_err(|e| tracing::error!(error = %e, "fetching projects failed"))
    }

    /// `GET /projects/{id}`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `project` envelope.
    pub async fn get(&self, id: &EntityId) -> Result<Project, ApiError> {
        self.api
            .get(&format!("/projects/{id}"))
            .await
            .and_then(|body| take_field(body, "project"))
            .inspect_err(|e| tracing::error!(error = %e, %id, "fetching project failed"))
    }

    /// `POST /projects`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `project` envelope.
    pub async fn create<B: Serialize + ?Sized>(&self, data: &B) -> Result<Project, ApiError> {
        self.api
            .post("/projects", data)
            .await
            .and_then(|body| take_field(body, "project"))
            .inspect_err(|e| tracing::error!(error = %e, "creating project failed"))
    }

    /// `PUT /projects/{id}`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `project` envelope.
    pub async fn update<B: Serialize + ?Sized>(&self, id: &EntityId, data: &B) -> Result<Project, ApiError> {
        self.api
            .put(&format!("/projects/{id}"), data)
            .await
            .and_then(|body| take_field(body, "project"))
            .inspect_err(|e| tracing::error!(error = %e, %id, "updating project failed"))
    }

    /// `DELETE /projects/{id}`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors.
    pub async fn delete(&self, id: &EntityId) -> Result<(), ApiError> {
        self.api
            .delete::<()>(&format!("/projects/{id}"), None)
            .await
            .map(drop)
            .inspect_err(|e| tracing::error!(error = %e, %id, "deleting project failed"))
    }

    /// `POST /projects/{id}/members`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `member` envelope.
    pub async fn add_member(&self, project_id: &EntityId, user_id: &EntityId) -> Result<Member, ApiError> {
        self.api
            .post(&format!("/projects/{project_id}/members"), &json!({ "user_id": user_id }))
            .await
            .and_then(|body| take_field(body, "member"))
            .inspect_err(|e| tracing::error!(error = %e, %project_id, "adding project member failed"))
    }

    /// `DELETE /projects/{id}/members` with the user id in the body.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors.
    pub async fn remove_member(&self, project_id: &EntityId, user_id: &EntityId) -> Result<(), ApiError> {
        self.api
            .delete(&format!("/projects/{project_id}/members"), Some(&json!({ "user_id": user_id })))
            .await
            .map(drop)
            .inspect_err(|e| tracing::error!(error = %e, %project_id, "removing project member failed"))
    }
}
