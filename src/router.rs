//! Route table and the authentication guard for view navigation.
//!
//! DESIGN
//! ======
//! The guard is a pure function of the target path and whether a token is
//! persisted; [`Router`] only supplies the latter from the session. No
//! request is made while deciding a navigation.

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::session::SessionContext;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const HOME_PATH: &str = "/dashboard";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub requires_auth: bool,
    /// Set for alias routes that immediately forward elsewhere.
    pub redirect: Option<&'static str>,
}

const fn page(path: &'static str, name: &'static str, requires_auth: bool) -> Route {
    Route { path, name, requires_auth, redirect: None }
}

pub const ROUTES: &[Route] = &[
    Route { path: "/", name: "root", requires_auth: false, redirect: Some(HOME_PATH) },
    page(LOGIN_PATH, "login", false),
    page(REGISTER_PATH, "register", false),
    page(HOME_PATH, "dashboard", true),
    page("/projects", "projects", true),
    page("/kanban", "kanban", true),
    page("/projects/:id", "project-detail", true),
    page("/tasks", "tasks", true),
    page("/tasks/:id", "task-detail", true),
    page("/profile", "profile", true),
];

/// A route plus the `:param` values captured from the path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: &'static Route,
    pub params: BTreeMap<&'static str, String>,
}

/// Outcome of a navigation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(&'static str),
}

/// Drop the query string, fragment and trailing slash.
fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn match_route(route: &'static Route, path: &str) -> Option<RouteMatch> {
    let mut pattern = route.path.split('/');
    let mut actual = path.split('/');
    let mut params = BTreeMap::new();
    loop {
        match (pattern.next(), actual.next()) {
            (None, None) => return Some(RouteMatch { route, params }),
            (Some(p), Some(a)) => match p.strip_prefix(':') {
                Some(name) if !a.is_empty() => {
                    params.insert(name, a.to_owned());
                }
                Some(_) => return None,
                None if p == a => {}
                None => return None,
            },
            _ => return None,
        }
    }
}

/// First route in table order matching `path`.
#[must_use]
pub fn resolve(path: &str) -> Option<RouteMatch> {
    let path = normalize(path);
    ROUTES.iter().find_map(|route| match_route(route, path))
}

/// Decide a navigation to `path`.
///
/// Protected routes send unauthenticated users to the login page; signed-in
/// users are bounced off the login and register pages. Unknown paths are
/// public. Alias routes are followed and the guard applies to their target.
#[must_use]
pub fn guard(path: &str, authenticated: bool) -> Navigation {
    let path = normalize(path);
    let matched = resolve(path);

    if let Some(target) = matched.as_ref().and_then(|m| m.route.redirect) {
        return match guard(target, authenticated) {
            Navigation::Proceed => Navigation::Redirect(target),
            redirect @ Navigation::Redirect(_) => redirect,
        };
    }

    let requires_auth = matched.is_some_and(|m| m.route.requires_auth);
    if requires_auth && !authenticated {
        Navigation::Redirect(LOGIN_PATH)
    } else if !requires_auth && authenticated && (path == LOGIN_PATH || path == REGISTER_PATH) {
        Navigation::Redirect(HOME_PATH)
    } else {
        Navigation::Proceed
    }
}

/// Navigation guard bound to a live session.
#[derive(Debug, Clone)]
pub struct Router {
    session: Arc<SessionContext>,
}

impl Router {
    #[must_use]
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn navigate(&self, path: &str) -> Navigation {
        let decision = guard(path, self.session.is_authenticated());
        tracing::debug!(path, ?decision, "navigation");
        decision
    }
}
