use super::*;
use crate::session::{ClearReason, TokenStore};
use crate::test_helpers::{MockApi, TestSession, test_session, user_json};
use serde_json::json;
use std::time::Duration;

fn store(mock: &MockApi, t: &TestSession) -> AuthStore {
    AuthStore::new(AuthService::new(mock.client(&t.session)))
}

fn credentials() -> Credentials {
    Credentials::new("ada@example.test", "secret")
}

// =============================================================
// Derived flags
// =============================================================

#[tokio::test]
async fn role_flags_false_without_user() {
    let mock = MockApi::start().await;
    let t = test_session(Some("abc"));
    let auth = store(&mock, &t);

    assert!(auth.user().is_none());
    assert!(!auth.is_admin());
    assert!(!auth.is_manager());
    assert!(auth.is_authenticated());
}

#[tokio::test]
async fn login_sets_user_and_role_flags() {
    let mock = MockApi::start().await;
    mock.respond("POST", "/auth/login", 200, json!({ "token": "t", "user": user_json(1, &["admin"]) }));
    let t = test_session(None);
    let auth = store(&mock, &t);

    auth.login_user(&credentials()).await.unwrap();

    let state = auth.snapshot();
    assert_eq!(state.user.as_ref().unwrap().id.as_str(), "1");
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert!(auth.is_admin());
    assert!(!auth.is_manager());
    assert!(auth.is_authenticated());
}

#[tokio::test]
async fn manager_flag_follows_project_manager_slug() {
    let mock = MockApi::start().await;
    mock.respond("POST", "/auth/login", 200, json!({ "token": "t", "user": user_json(2, &["member", "project-manager"]) }));
    let t = test_session(None);
    let auth = store(&mock, &t);

    auth.login_user(&credentials()).await.unwrap();

    assert!(auth.is_manager());
    assert!(!auth.is_admin());
}

// =============================================================
// login / register failures
// =============================================================

#[tokio::test]
async fn login_failure_records_server_message_and_rethrows() {
    let mock = MockApi::start().await;
    mock.respond("POST", "/auth/login", 422, json!({ "message": "These credentials do not match our records." }));
    let t = test_session(None);
    let auth = store(&mock, &t);

    let err = auth.login_user(&credentials()).await.unwrap_err();

    assert_eq!(err.status(), Some(422));
    let state = auth.snapshot();
    assert_eq!(state.error.as_deref(), Some("These credentials do not match our records."));
    assert!(!state.loading);
    assert!(state.user.is_none());
}

#[tokio::test]
async fn login_without_token_uses_fallback_message() {
    let mock = MockApi::start().await;
    mock.respond("POST", "/auth/login", 200, json!({ "user": user_json(1, &["admin"]) }));
    let t = test_session(None);
    let auth = store(&mock, &t);

    assert!(auth.login_user(&credentials()).await.is_err());

    assert_eq!(auth.snapshot().error.as_deref(), Some("Login failed"));
    assert!(auth.user().is_none());
    assert!(!auth.is_admin());
}

#[tokio::test]
async fn register_sets_user() {
    let mock = MockApi::start().await;
    mock.respond("POST", "/auth/register", 201, json!({ "token": "r", "user": user_json(3, &[]) }));
    let t = test_session(None);
    let auth = store(&mock, &t);
    let registration = Registration {
        name: "Ada".to_owned(),
        email: "ada@example.test".to_owned(),
        password: "secret".to_owned(),
        password_confirmation: "secret".to_owned(),
    };

    auth.register_user(&registration).await.unwrap();

    assert_eq!(auth.user().unwrap().id.as_str(), "3");
    assert!(auth.is_authenticated());
}

// =============================================================
// logout
// =============================================================

#[tokio::test]
async fn logout_clears_user_even_when_remote_fails() {
    let mock = MockApi::start().await;
    mock.respond("POST", "/auth/login", 200, json!({ "token": "t", "user": user_json(1, &["admin"]) }));
    mock.respond("POST", "/auth/logout", 500, json!({ "message": "down" }));
    let t = test_session(None);
    let auth = store(&mock, &t);
    auth.login_user(&credentials()).await.unwrap();

    auth.logout_user().await;

    let state = auth.snapshot();
    assert!(state.user.is_none());
    assert!(state.error.is_none());
    assert!(!state.loading);
    assert!(!auth.is_authenticated());
    assert!(!auth.is_admin());
}

// =============================================================
// fetch_current_user
// =============================================================

#[tokio::test]
async fn fetch_current_user_without_token_is_noop() {
    let mock = MockApi::start().await;
    let t = test_session(None);
    let auth = store(&mock, &t);

    assert!(auth.fetch_current_user().await.is_none());
    assert!(mock.requests().is_empty());
    assert!(!auth.snapshot().loading);
}

#[tokio::test]
async fn fetch_current_user_with_persisted_token_loads_roles() {
    let mock = MockApi::start().await;
    mock.respond("GET", "/auth/me", 200, json!({ "user": user_json(4, &["admin", "project-manager"]) }));
    let t = test_session(Some("abc"));
    let auth = store(&mock, &t);
    assert!(!auth.is_admin());

    let user = auth.fetch_current_user().await.unwrap();

    assert_eq!(user.id.as_str(), "4");
    let calls = mock.requests_to("GET", "/auth/me");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer abc"));
    assert_eq!(auth.user(), Some(user));
    assert!(auth.is_admin());
    assert!(auth.is_manager());
}

#[tokio::test]
async fn fetch_current_user_failure_clears_user() {
    let mock = MockApi::start().await;
    mock.respond("POST", "/auth/login", 200, json!({ "token": "t", "user": user_json(1, &["admin"]) }));
    mock.respond("GET", "/auth/me", 500, json!({}));
    let t = test_session(None);
    let auth = store(&mock, &t);
    auth.login_user(&credentials()).await.unwrap();

    assert!(auth.fetch_current_user().await.is_none());

    let state = auth.snapshot();
    assert!(state.user.is_none());
    assert_eq!(state.error.as_deref(), Some("Could not load the current user"));
    assert!(auth.is_authenticated(), "profile failure is not a session failure");
}

// =============================================================
// Session events
// =============================================================

#[tokio::test]
async fn cleared_event_drops_user() {
    let mock = MockApi::start().await;
    mock.respond("POST", "/auth/login", 200, json!({ "token": "t", "user": user_json(1, &[]) }));
    let t = test_session(None);
    let auth = store(&mock, &t);
    auth.login_user(&credentials()).await.unwrap();

    auth.handle_session_event(SessionEvent::Established);
    assert!(auth.user().is_some());
    auth.handle_session_event(SessionEvent::Cleared(ClearReason::Rejected { status: 401 }));
    assert!(auth.user().is_none());
}

#[tokio::test]
async fn watch_session_reacts_to_interceptor_teardown() {
    let mock = MockApi::start().await;
    mock.respond("POST", "/auth/login", 200, json!({ "token": "t", "user": user_json(1, &["admin"]) }));
    mock.respond("GET", "/projects", 401, json!({ "message": "Unauthenticated." }));
    let t = test_session(None);
    let auth = Arc::new(store(&mock, &t));
    let watcher = auth.watch_session();
    auth.login_user(&credentials()).await.unwrap();
    let mut changes = auth.subscribe();
    changes.mark_unchanged();

    let api = mock.client(&t.session);
    assert!(api.get("/projects").await.is_err());

    tokio::time::timeout(Duration::from_secs(1), changes.wait_for(|s| s.user.is_none()))
        .await
        .expect("user should be cleared after teardown")
        .unwrap();
    assert!(!auth.is_authenticated());
    assert!(!auth.is_admin());
    watcher.abort();
}

#[tokio::test]
async fn is_authenticated_ignores_user_state() {
    let mock = MockApi::start().await;
    mock.respond("POST", "/auth/login", 200, json!({ "token": "t", "user": user_json(1, &[]) }));
    let t = test_session(None);
    let auth = store(&mock, &t);
    auth.login_user(&credentials()).await.unwrap();

    t.store.remove().unwrap();

    assert!(auth.user().is_some());
    assert!(!auth.is_authenticated());
}
