//! Task endpoints.

use serde::Serialize;
use serde_json::json;

use super::http::{ApiClient, take_field};
use super::types::{EntityId, Task, TaskStatus};
use crate::error::ApiError;

/// Query filters for `GET /tasks`; unset fields are omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TaskFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<EntityId>,
}

#[derive(Debug, Clone)]
pub struct TaskService {
    api: ApiClient,
}

impl TaskService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /tasks` with `filters` as query parameters.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `tasks` envelope.
    pub async fn list(&self, filters: &TaskFilters) -> Result<Vec<Task>, ApiError> {
        self.api
            .get_with_query("/tasks", filters)
            .await
            .and_then(|body| take_field(body, "tasks"))
            .inspect_err(|e| tracing::error!(error = %e, "fetching tasks failed"))
    }

    /// `GET /tasks/{id}`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `task` envelope.
    pub async fn get(&self, id: &EntityId) -> Result<Task, ApiError> {
        self.api
            .get(&format!("/tasks/{id}"))
            .await
            .and_then(|body| take_field(body, "task"))
            .inspect_err(|e| tracing::error!(error = %e, %id, "fetching task failed"))
    }

    /// `POST /tasks`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `task` envelope.
    pub async fn create<B: Serialize + ?Sized>(&self, data: &B) -> Result<Task, ApiError> {
        self.api
            .post("/tasks", data)
            .await
            .and_then(|body| take_field(body, "task"))
            .inspect_err(|e| tracing::error!(error = %e, "creating task failed"))
    }

    /// `PUT /tasks/{id}`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `task` envelope.
    pub async fn update<B: Serialize + ?Sized>(&self, id: &EntityId, data: &B) -> Result<Task, ApiError> {
        self.api
            .put(&format!("/tasks/{id}"), data)
            .await
            .and_then(|body| take_field(body, "task"))
            .inspect_err(|e| tracing::error!(error = %e, %id, "updating task failed"))
    }

    /// `PATCH /tasks/{id}/status`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors or a malformed `task` envelope.
    pub async fn update_status(&self, id: &EntityId, status: TaskStatus) -> Result<Task, ApiError> {
        self.api
            .patch(&format!("/tasks/{id}/status"), Some(&json!({ "status": status })))
            .await
            .and_then(|body| take_field(body, "task"))
            .inspect_err(|e| tracing::error!(error = %e, %id, status = status.as_str(), "updating task status failed"))
    }

    /// `DELETE /tasks/{id}`.
    ///
    /// # Errors
    ///
    /// Transport/HTTP errors.
    pub async fn delete(&self, id: &EntityId) -> Result<(), ApiError> {
        self.api
            .delete::<()>(&format!("/tasks/{id}"), None)
            .await
            .map(drop)
            .inspect_err(|e| tracing::error!(error = %e, %id, "deleting task failed"))
    }
}
