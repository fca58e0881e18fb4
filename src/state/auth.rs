//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by route guards and user-aware views to coordinate login redirects
//! and identity-dependent rendering. "Authenticated" is always read from the
//! [`SessionContext`](crate::session::SessionContext); this store only owns
//! the in-memory user and reacts to session teardown events.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::{Arc, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{Tracked, tracked};
use crate::error::ApiError;
use crate::net::auth::{AuthService, Credentials, Registration};
use crate::net::types::{ADMIN_ROLE, AuthPayload, MANAGER_ROLE, User};
use crate::session::SessionEvent;

const LOGIN_FAILED: &str = "Login failed";
const REGISTER_FAILED: &str = "Registration failed";
const FETCH_USER_FAILED: &str = "Could not load the current user";

/// Authentication state tracking the current user and request status.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Tracked for AuthState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

pub struct AuthStore {
    service: AuthService,
    state: watch::Sender<AuthState>,
}

impl AuthStore {
    #[must_use]
    pub fn new(service: AuthService) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self { service, state }
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Recomputed on every call so out-of-band teardown is always visible.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.service.is_authenticated()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.has_role(MANAGER_ROLE)
    }

    fn has_role(&self, slug: &str) -> bool {
        self.state.borrow().user.as_ref().is_some_and(|user| user.has_role(slug))
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn login_user(&self, credentials: &Credentials) -> Result<AuthPayload, ApiError> {
        tracked(&self.state, LOGIN_FAILED, self.service.login(credentials), |s, result| {
            if let Ok(payload) = result {
                s.user.clone_from(&payload.user);
            }
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn register_user(&self, registration: &Registration) -> Result<AuthPayload, ApiError> {
        tracked(&self.state, REGISTER_FAILED, self.service.register(registration), |s, result| {
            if let Ok(payload) = result {
                s.user.clone_from(&payload.user);
            }
        })
        .await
    }

    /// Log out locally no matter what the server says. Never fails.
    pub async fn logout_user(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        self.service.logout().await;
        self.state.send_modify(|s| {
            s.user = None;
            s.loading = false;
        });
    }

    /// Load the current user when a token is persisted.
    ///
    /// Returns `None` without any request when unauthenticated, and `None`
    /// (with the user cleared and `error` set) when the fetch fails.
    pub async fn fetch_current_user(&self) -> Option<User> {
        if !self.is_authenticated() {
            return None;
        }
        tracked(&self.state, FETCH_USER_FAILED, self.service.current_user(), |s, result| {
            s.user = result.as_ref().ok().cloned();
        })
        .await
        .ok()
    }

    /// Drop the in-memory user whenever the session is cleared.
    pub fn handle_session_event(&self, event: SessionEvent) {
        if let SessionEvent::Cleared(reason) = event {
            tracing::debug!(?reason, "session cleared; dropping current user");
            self.state.send_modify(|s| s.user = None);
        }
    }

    /// Follow session events until the store is dropped.
    pub fn watch_session(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.service.session().subscribe();
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let event = events.recv().await;
                let Some(store) = store.upgrade() else { break };
                match event {
                    Ok(event) => store.handle_session_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session events lagged; re-deriving state");
                        if !store.is_authenticated() {
                            store.state.send_modify(|s| s.user = None);
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
