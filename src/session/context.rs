//! The single accessor for session state.
//!
//! ARCHITECTURE
//! ============
//! Token persistence, the default `Authorization` header, teardown and the
//! login redirect all live here so their ordering is fixed in one place:
//! remove token, drop header, publish [`SessionEvent::Cleared`], then
//! schedule the redirect. The HTTP client, the auth service, the auth store
//! and the route guard all consult this object instead of keeping their own
//! notion of "logged in".
//!
//! TRADE-OFFS
//! ==========
//! There is no mutual exclusion across in-flight requests: a request that
//! already captured its header keeps it even if a refresh or teardown lands
//! while it is on the wire.

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;

use super::navigator::Navigator;
use super::store::TokenStore;
use crate::error::StorageError;

const EVENT_CAPACITY: usize = 16;

/// What counts as a rejected session and how the user is sent to login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailurePolicy {
    /// Response statuses that tear the session down.
    pub statuses: Vec<u16>,
    /// Delay before navigating to `login_path`; zero navigates immediately.
    pub redirect_delay: Duration,
    pub login_path: String,
}

impl Default for AuthFailurePolicy {
    fn default() -> Self {
        Self { statuses: vec![401, 403], redirect_delay: Duration::from_millis(100), login_path: "/login".to_owned() }
    }
}

impl AuthFailurePolicy {
    #[must_use]
    pub fn is_auth_failure(&self, status: u16) -> bool {
        self.statuses.contains(&status)
    }
}

/// Why the session was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    Logout,
    RefreshFailed,
    /// The API rejected a request with an auth-failure status.
    Rejected { status: u16 },
}

/// Session lifecycle notifications for observers such as the auth store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Established,
    Cleared(ClearReason),
}

pub struct SessionContext {
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    policy: AuthFailurePolicy,
    default_auth: Mutex<Option<String>>,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("policy", &self.policy)
            .field("default_auth_set", &self.default_auth_header().is_some())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(store: Arc<dyn TokenStore>, navigator: Arc<dyn Navigator>, policy: AuthFailurePolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { store, navigator, policy, default_auth: Mutex::new(None), events }
    }

    #[must_use]
    pub fn policy(&self) -> &AuthFailurePolicy {
        &self.policy
    }

    /// Receive every subsequent [`SessionEvent`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Read the persisted token.
    ///
    /// # Errors
    ///
    /// Propagates the token store's read failure.
    pub fn token(&self) -> Result<Option<String>, StorageError> {
        self.store.load()
    }

    /// Whether a token is persisted; read failures count as "no token".
    #[must_use]
    pub fn has_token(&self) -> bool {
        match self.store.load() {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "token read failed; treating session as absent");
                false
            }
        }
    }

    /// The default `Authorization` value applied when no token is read.
    #[must_use]
    pub fn default_auth_header(&self) -> Option<String> {
        self.lock_default_auth().clone()
    }

    /// Whether a token is persisted. Backfills the default header when a
    /// token exists but the header was never set (e.g. after a restart).
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        match self.store.load() {
            Ok(Some(token)) => {
                let mut header = self.lock_default_auth();
                if header.is_none() {
                    *header = Some(bearer(&token));
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "token read failed; treating session as absent");
                false
            }
        }
    }

    /// `Authorization` value for an outbound request.
    ///
    /// The persisted token wins; otherwise the default header applies. A
    /// storage read failure sends the request without credentials.
    #[must_use]
    pub fn authorization_for_request(&self) -> Option<String> {
        match self.store.load() {
            Ok(Some(token)) => Some(bearer(&token)),
            Ok(None) => self.default_auth_header(),
            Err(e) => {
                tracing::warn!(error = %e, "token read failed; sending request without credentials");
                None
            }
        }
    }

    /// Persist `token` and install it as the default header.
    ///
    /// # Errors
    ///
    /// Returns the storage failure; the header is left untouched in that case.
    pub fn establish(&self, token: &str) -> Result<(), StorageError> {
        self.store.save(token)?;
        *self.lock_default_auth() = Some(bearer(token));
        let _ = self.events.send(SessionEvent::Established);
        tracing::debug!("session established");
        Ok(())
    }

    /// Remove the persisted token, then the default header, then notify.
    ///
    /// Never fails: a storage removal error is logged and the header is still
    /// dropped.
    pub fn clear(&self, reason: ClearReason) {
        if let Err(e) = self.store.remove() {
            tracing::error!(error = %e, ?reason, "failed to remove persisted token");
        }
        self.lock_default_auth().take();
        let _ = self.events.send(SessionEvent::Cleared(reason));
        tracing::info!(?reason, "session cleared");
    }

    /// Tear the session down after the API rejected it, then send the user
    /// to the login route according to the policy.
    pub fn invalidate(&self, status: u16) {
        tracing::warn!(%status, "authentication rejected; clearing session");
        self.clear(ClearReason::Rejected { status });
        self.schedule_login_redirect();
    }

    /// Scoped teardown: the session is cleared exactly once when the returned
    /// guard drops, including when the owning future is cancelled.
    #[must_use = "the session is cleared when the guard drops"]
    pub fn teardown(&self, reason: ClearReason) -> SessionTeardown<'_> {
        SessionTeardown { session: self, reason }
    }

    fn schedule_login_redirect(&self) {
        let navigator = Arc::clone(&self.navigator);
        let path = self.policy.login_path.clone();
        let delay = self.policy.redirect_delay;
        if delay.is_zero() {
            navigator.navigate(&path);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.navigate(&path);
                });
            }
            Err(_) => navigator.navigate(&path),
        }
    }

    fn lock_default_auth(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.default_auth.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Guard returned by [`SessionContext::teardown`].
pub struct SessionTeardown<'a> {
    session: &'a SessionContext,
    reason: ClearReason,
}

impl Drop for SessionTeardown<'_> {
    fn drop(&mut self) {
        self.session.clear(self.reason);
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
