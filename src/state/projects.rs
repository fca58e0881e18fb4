//! Project list and the project currently open in a detail view.

#[cfg(test)]
#[path = "projects_test.rs"]
mod projects_test;

use serde::Serialize;
use tokio::sync::watch;

use super::{Tracked, clear_current_if, remove_by_id, replace_by_id, replace_current, tracked};
use crate::error::ApiError;
use crate::net::projects::ProjectService;
use crate::net::types::{EntityId, Member, Project};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectsState {
    pub projects: Vec<Project>,
    pub current_project: Option<Project>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Tracked for ProjectsState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

impl ProjectsState {
    /// Run `edit` on the open project's members if it is `project_id`.
    fn edit_current_members(&mut self, project_id: &EntityId, edit: impl FnOnce(&mut Vec<Member>)) {
        if let Some(project) = self.current_project.as_mut().filter(|p| &p.id == project_id) {
            edit(&mut project.members);
        }
    }
}

pub struct ProjectStore {
    service: ProjectService,
    state: watch::Sender<ProjectsState>,
}

impl ProjectStore {
    #[must_use]
    pub fn new(service: ProjectService) -> Self {
        let (state, _) = watch::channel(ProjectsState::default());
        Self { service, state }
    }

    #[must_use]
    pub fn snapshot(&self) -> ProjectsState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProjectsState> {
        self.state.subscribe()
    }

    /// Replace the list. Failures only land in `error`.
    pub async fn fetch_projects(&self) {
        let _ = tracked(&self.state, "Could not load projects", self.service.list(), |s, result| {
            if let Ok(projects) = result {
                s.projects.clone_from(projects);
            }
        })
        .await;
    }

    /// Open a project. Failures only land in `error`.
    pub async fn fetch_project(&self, id: &EntityId) -> Option<Project> {
        let fallback = format!("Could not load project {id}");
        tracked(&self.state, &fallback, self.service.get(id), |s, result| {
            if let Ok(project) = result {
                s.current_project = Some(project.clone());
            }
        })
        .await
        .ok()
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn create_project<B: Serialize + ?Sized>(&self, data: &B) -> Result<Project, ApiError> {
        tracked(&self.state, "Could not create project", self.service.create(data), |s, result| {
            if let Ok(project) = result {
                s.projects.push(project.clone());
            }
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn update_project<B: Serialize + ?Sized>(&self, id: &EntityId, data: &B) -> Result<Project, ApiError> {
        let fallback = format!("Could not update project {id}");
        tracked(&self.state, &fallback, self.service.update(id, data), |s, result| {
            if let Ok(project) = result {
                replace_by_id(&mut s.projects, project);
                replace_current(&mut s.current_project, project);
            }
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn delete_project(&self, id: &EntityId) -> Result<(), ApiError> {
        let fallback = format!("Could not delete project {id}");
        tracked(&self.state, &fallback, self.service.delete(id), |s, result| {
            if result.is_ok() {
                remove_by_id(&mut s.projects, id);
                clear_current_if(&mut s.current_project, id);
            }
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn add_member(&self, project_id: &EntityId, user_id: &EntityId) -> Result<Member, ApiError> {
        let fallback = format!("Could not add a member to project {project_id}");
        tracked(&self.state, &fallback, self.service.add_member(project_id, user_id), |s, result| {
            if let Ok(member) = result {
                s.edit_current_members(project_id, |members| members.push(member.clone()));
            }
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn remove_member(&self, project_id: &EntityId, user_id: &EntityId) -> Result<(), ApiError> {
        let fallback = format!("Could not remove a member from project {project_id}");
        tracked(&self.state, &fallback, self.service.remove_member(project_id, user_id), |s, result| {
            if result.is_ok() {
                s.edit_current_members(project_id, |members| remove_by_id(members, user_id));
            }
        })
        .await
    }
}
