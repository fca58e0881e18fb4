//! Task list with per-status and per-project views.

#[cfg(test)]
#[path = "tasks_test.rs"]
mod tasks_test;

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::watch;

use super::{Tracked, clear_current_if, remove_by_id, replace_by_id, replace_current, tracked};
use crate::error::ApiError;
use crate::net::tasks::{TaskFilters, TaskService};
use crate::net::types::{EntityId, Task, TaskStatus};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TasksState {
    pub tasks: Vec<Task>,
    pub current_task: Option<Task>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Tracked for TasksState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

impl TasksState {
    #[must_use]
    pub fn with_status(&self, status: TaskStatus) -> Vec<Task> {
        self.tasks.iter().filter(|t| t.status == status).cloned().collect()
    }

    #[must_use]
    pub fn todo_tasks(&self) -> Vec<Task> {
        self.with_status(TaskStatus::Todo)
    }

    #[must_use]
    pub fn in_progress_tasks(&self) -> Vec<Task> {
        self.with_status(TaskStatus::InProgress)
    }

    #[must_use]
    pub fn completed_tasks(&self) -> Vec<Task> {
        self.with_status(TaskStatus::Completed)
    }

    /// Tasks grouped by project, in list order. Tasks without a project
    /// are grouped under `None`.
    #[must_use]
    pub fn tasks_by_project(&self) -> BTreeMap<Option<EntityId>, Vec<Task>> {
        let mut grouped: BTreeMap<Option<EntityId>, Vec<Task>> = BTreeMap::new();
        for task in &self.tasks {
            grouped.entry(task.project_id.clone()).or_default().push(task.clone());
        }
        grouped
    }

    fn splice(&mut self, task: &Task) {
        replace_by_id(&mut self.tasks, task);
        replace_current(&mut self.current_task, task);
    }
}

pub struct TaskStore {
    service: TaskService,
    state: watch::Sender<TasksState>,
}

impl TaskStore {
    #[must_use]
    pub fn new(service: TaskService) -> Self {
        let (state, _) = watch::channel(TasksState::default());
        Self { service, state }
    }

    #[must_use]
    pub fn snapshot(&self) -> TasksState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TasksState> {
        self.state.subscribe()
    }

    /// Replace the list with the tasks matching `filters`. Failures only
    /// land in `error`.
    pub async fn fetch_tasks(&self, filters: &TaskFilters) {
        let _ = tracked(&self.state, "Could not load tasks", self.service.list(filters), |s, result| {
            if let Ok(tasks) = result {
                s.tasks.clone_from(tasks);
            }
        })
        .await;
    }

    /// Open a task. Failures only land in `error`.
    pub async fn fetch_task(&self, id: &EntityId) -> Option<Task> {
        let fallback = format!("Could not load task {id}");
        tracked(&self.state, &fallback, self.service.get(id), |s, result| {
            if let Ok(task) = result {
                s.current_task = Some(task.clone());
            }
        })
        .await
        .ok()
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn create_task<B: Serialize + ?Sized>(&self, data: &B) -> Result<Task, ApiError> {
        tracked(&self.state, "Could not create task", self.service.create(data), |s, result| {
            if let Ok(task) = result {
                s.tasks.push(task.clone());
            }
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn update_task<B: Serialize + ?Sized>(&self, id: &EntityId, data: &B) -> Result<Task, ApiError> {
        let fallback = format!("Could not update task {id}");
        tracked(&self.state, &fallback, self.service.update(id, data), |s, result| {
            if let Ok(task) = result {
                s.splice(task);
            }
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn update_task_status(&self, id: &EntityId, status: TaskStatus) -> Result<Task, ApiError> {
        let fallback = format!("Could not update the status of task {id}");
        tracked(&self.state, &fallback, self.service.update_status(id, status), |s, result| {
            if let Ok(task) = result {
                s.splice(task);
            }
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn delete_task(&self, id: &EntityId) -> Result<(), ApiError> {
        let fallback = format!("Could not delete task {id}");
        tracked(&self.state, &fallback, self.service.delete(id), |s, result| {
            if result.is_ok() {
                remove_by_id(&mut s.tasks, id);
                clear_current_if(&mut s.current_task, id);
            }
        })
        .await
    }
}
