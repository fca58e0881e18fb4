use super::*;
use crate::test_helpers::{MockApi, test_session};
use serde_json::{Value, json};

fn task_json(id: u64, status: &str, project_id: Option<u64>) -> Value {
    json!({ "id": id, "title": format!("Task {id}"), "status": status, "project_id": project_id })
}

fn task(id: u64, status: &str, project_id: Option<u64>) -> Task {
    serde_json::from_value(task_json(id, status, project_id)).unwrap()
}

fn store(mock: &MockApi) -> TaskStore {
    let t = test_session(Some("tok"));
    TaskStore::new(TaskService::new(mock.client(&t.session)))
}

async fn loaded_store(mock: &MockApi) -> TaskStore {
    mock.respond(
        "GET",
        "/tasks",
        200,
        json!({ "tasks": [
            task_json(1, "todo", Some(1)),
            task_json(2, "in_progress", Some(1)),
            task_json(3, "completed", Some(2)),
        ] }),
    );
    mock.respond("GET", "/tasks/2", 200, json!({ "task": task_json(2, "in_progress", Some(1)) }));
    let tasks = store(mock);
    tasks.fetch_tasks(&TaskFilters::default()).await;
    tasks.fetch_task(&EntityId::from(2)).await;
    tasks
}

// =============================================================
// Derived views
// =============================================================

#[test]
fn status_views_partition_the_list() {
    let state = TasksState {
        tasks: vec![task(1, "todo", None), task(2, "in_progress", None), task(3, "todo", None), task(4, "archived", None)],
        ..TasksState::default()
    };

    assert_eq!(state.todo_tasks().len(), 2);
    assert_eq!(state.in_progress_tasks().len(), 1);
    assert!(state.completed_tasks().is_empty());
    assert_eq!(state.with_status(TaskStatus::Other)[0].id, EntityId::from(4));
}

#[test]
fn tasks_by_project_groups_in_list_order() {
    let state = TasksState {
        tasks: vec![task(1, "todo", Some(2)), task(2, "todo", None), task(3, "completed", Some(2))],
        ..TasksState::default()
    };

    let grouped = state.tasks_by_project();

    let ids: Vec<_> = grouped[&Some(EntityId::from(2))].iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids, vec![EntityId::from(1), EntityId::from(3)]);
    assert_eq!(grouped[&None].len(), 1);
    assert_eq!(grouped.len(), 2);
}

// =============================================================
// Fetching
// =============================================================

#[tokio::test]
async fn fetch_tasks_sends_filters_as_query() {
    let mock = MockApi::start().await;
    mock.respond("GET", "/tasks", 200, json!({ "tasks": [task_json(1, "todo", Some(5))] }));
    let tasks = store(&mock);
    let filters = TaskFilters { project_id: Some(EntityId::from(5)), status: Some(TaskStatus::Todo), ..TaskFilters::default() };

    tasks.fetch_tasks(&filters).await;

    assert_eq!(tasks.snapshot().tasks.len(), 1);
    let calls = mock.requests_to("GET", "/tasks");
    assert_eq!(calls[0].query.as_deref(), Some("project_id=5&status=todo"));
}

#[tokio::test]
async fn fetch_failure_is_swallowed_into_error() {
    let mock = MockApi::start().await;
    mock.respond("GET", "/tasks", 503, json!({ "message": "Maintenance" }));
    let tasks = store(&mock);

    tasks.fetch_tasks(&TaskFilters::default()).await;

    let state = tasks.snapshot();
    assert_eq!(state.error.as_deref(), Some("Maintenance"));
    assert!(state.tasks.is_empty());
    assert!(!state.loading);
}

// =============================================================
// Mutations
// =============================================================

#[tokio::test]
async fn create_appends() {
    let mock = MockApi::start().await;
    mock.respond("POST", "/tasks", 201, json!({ "task": task_json(4, "todo", Some(2)) }));
    let tasks = loaded_store(&mock).await;

    tasks.create_task(&json!({ "title": "Task 4", "project_id": 2 })).await.unwrap();

    let state = tasks.snapshot();
    assert_eq!(state.tasks.len(), 4);
    assert_eq!(state.todo_tasks().len(), 2);
}

#[tokio::test]
async fn update_status_moves_task_between_columns() {
    let mock = MockApi::start().await;
    mock.respond("PATCH", "/tasks/2/status", 200, json!({ "task": task_json(2, "completed", Some(1)) }));
    let tasks = loaded_store(&mock).await;

    let updated = tasks.update_task_status(&EntityId::from(2), TaskStatus::Completed).await.unwrap();

    assert_eq!(updated.status, TaskStatus::Completed);
    let state = tasks.snapshot();
    assert!(state.in_progress_tasks().is_empty());
    assert_eq!(state.completed_tasks().len(), 2);
    assert_eq!(state.current_task.unwrap().status, TaskStatus::Completed);
    assert_eq!(mock.requests_to("PATCH", "/tasks/2/status")[0].body, json!({ "status": "completed" }));
}

#[tokio::test]
async fn update_status_failure_keeps_list_and_returns_error() {
    let mock = MockApi::start().await;
    mock.respond("PATCH", "/tasks/2/status", 500, json!({}));
    let tasks = loaded_store(&mock).await;

    assert!(tasks.update_task_status(&EntityId::from(2), TaskStatus::Completed).await.is_err());

    let state = tasks.snapshot();
    assert_eq!(state.error.as_deref(), Some("Could not update the status of task 2"));
    assert_eq!(state.in_progress_tasks().len(), 1);
}

#[tokio::test]
async fn update_replaces_by_id() {
    let mock = MockApi::start().await;
    let mut renamed = task_json(1, "todo", Some(1));
    renamed["title"] = json!("Renamed");
    mock.respond("PUT", "/tasks/1", 200, json!({ "task": renamed }));
    let tasks = loaded_store(&mock).await;

    tasks.update_task(&EntityId::from(1), &json!({ "title": "Renamed" })).await.unwrap();

    let state = tasks.snapshot();
    assert_eq!(state.tasks[0].title, "Renamed");
    assert_eq!(state.current_task.unwrap().title, "Task 2");
}

#[tokio::test]
async fn delete_removes_and_clears_current() {
    let mock = MockApi::start().await;
    mock.respond("DELETE", "/tasks/2", 200, json!({}));
    let tasks = loaded_store(&mock).await;

    tasks.delete_task(&EntityId::from(2)).await.unwrap();

    let state = tasks.snapshot();
    assert_eq!(state.tasks.len(), 2);
    assert!(state.current_task.is_none());
}
