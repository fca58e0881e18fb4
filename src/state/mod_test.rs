use super::*;
use serde_json::json;

fn task(id: u64, title: &str) -> Task {
    serde_json::from_value(json!({ "id": id, "title": title, "status": "todo" })).unwrap()
}

#[derive(Debug, Default)]
struct Probe {
    loading: bool,
    error: Option<String>,
    applied: usize,
}

impl Tracked for Probe {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

// =============================================================
// tracked
// =============================================================

#[tokio::test]
async fn tracked_marks_loading_while_running() {
    let (tx, rx) = watch::channel(Probe { error: Some("stale".to_owned()), ..Probe::default() });
    let result = tracked(
        &tx,
        "fallback",
        async {
            assert!(rx.borrow().loading);
            assert!(rx.borrow().error.is_none());
            Ok::<_, ApiError>(5)
        },
        |s, r| {
            if r.is_ok() {
                s.applied += 1;
            }
        },
    )
    .await;

    assert_eq!(result.unwrap(), 5);
    let state = rx.borrow();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(state.applied, 1);
}

#[tokio::test]
async fn tracked_records_fallback_error() {
    let (tx, rx) = watch::channel(Probe::default());
    let result: Result<(), ApiError> =
        tracked(&tx, "Could not load", async { Err(ApiError::MissingField("tasks")) }, |_, _| {}).await;

    assert!(result.is_err());
    assert_eq!(rx.borrow().error.as_deref(), Some("Could not load"));
    assert!(!rx.borrow().loading);
}

#[tokio::test]
async fn tracked_prefers_server_message() {
    let (tx, rx) = watch::channel(Probe::default());
    let err = ApiError::Status { status: 422, message: Some("Name is required".to_owned()), body: json!({}) };
    let _ = tracked::<_, (), _, _>(&tx, "Could not save", async { Err(err) }, |_, _| {}).await;

    assert_eq!(rx.borrow().error.as_deref(), Some("Name is required"));
}

// =============================================================
// list splicing
// =============================================================

#[test]
fn replace_by_id_swaps_matching_item() {
    let mut tasks = vec![task(1, "a"), task(2, "b")];
    assert!(replace_by_id(&mut tasks, &task(2, "B")));
    assert_eq!(tasks[1].title, "B");
    assert_eq!(tasks[0].title, "a");
}

#[test]
fn replace_by_id_ignores_unknown_item() {
    let mut tasks = vec![task(1, "a")];
    assert!(!replace_by_id(&mut tasks, &task(9, "z")));
    assert_eq!(tasks.len(), 1);
}

#[test]
fn remove_by_id_filters_all_matches() {
    let mut tasks = vec![task(1, "a"), task(2, "b"), task(1, "dup")];
    remove_by_id(&mut tasks, &EntityId::from(1));
    assert_eq!(tasks, vec![task(2, "b")]);
}

#[test]
fn replace_current_only_when_ids_match() {
    let mut current = Some(task(1, "a"));
    replace_current(&mut current, &task(2, "b"));
    assert_eq!(current.as_ref().unwrap().title, "a");
    replace_current(&mut current, &task(1, "A"));
    assert_eq!(current.as_ref().unwrap().title, "A");

    let mut empty: Option<Task> = None;
    replace_current(&mut empty, &task(1, "a"));
    assert!(empty.is_none());
}

#[test]
fn clear_current_if_matches() {
    let mut current = Some(task(1, "a"));
    clear_current_if(&mut current, &EntityId::from(2));
    assert!(current.is_some());
    clear_current_if(&mut current, &EntityId::from(1));
    assert!(current.is_none());
}
