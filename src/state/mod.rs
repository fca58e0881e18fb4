//! Observable state containers for view code.
//!
//! DESIGN
//! ======
//! Each store publishes a plain state struct through a `tokio::sync::watch`
//! channel. Views `subscribe()` for changes or take a `snapshot()`; only the
//! store mutates. Every operation runs through [`tracked`], which owns the
//! shared `loading`/`error` bookkeeping so a store method only describes its
//! request and how the result is spliced into state.

pub mod auth;
pub mod notifications;
pub mod projects;
pub mod tasks;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use std::future::Future;

use tokio::sync::watch;

use crate::error::ApiError;
use crate::net::types::{EntityId, Member, Notification, Project, Task};

/// State with the common `loading`/`error` pair.
pub(crate) trait Tracked {
    fn set_loading(&mut self, loading: bool);
    fn set_error(&mut self, error: Option<String>);
}

/// Run `op` with the shared bookkeeping: mark loading and clear the error,
/// await the request, then apply its result, record a user-facing error on
/// failure and clear loading in one update.
pub(crate) async fn tracked<S, T, F, A>(
    state: &watch::Sender<S>,
    fallback: &str,
    op: F,
    apply: A,
) -> Result<T, ApiError>
where
    S: Tracked,
    F: Future<Output = Result<T, ApiError>>,
    A: FnOnce(&mut S, &Result<T, ApiError>),
{
    state.send_modify(|s| {
        s.set_loading(true);
        s.set_error(None);
    });
    let result = op.await;
    state.send_modify(|s| {
        apply(s, &result);
        if let Err(e) = &result {
            s.set_error(Some(e.user_message(fallback)));
        }
        s.set_loading(false);
    });
    result
}

/// Resources whose list membership is decided by id.
pub trait Identified {
    fn entity_id(&self) -> &EntityId;
}

macro_rules! identified {
    ($($ty:ty),*) => {
        $(impl Identified for $ty {
            fn entity_id(&self) -> &EntityId {
                &self.id
            }
        })*
    };
}

identified!(Project, Task, Notification, Member);

/// Replace the item with `item`'s id in place. Returns false if absent.
pub(crate) fn replace_by_id<T: Identified>(items: &mut [T], item: &T) -> bool
where
    T: Clone,
{
    match items.iter_mut().find(|existing| existing.entity_id() == item.entity_id()) {
        Some(slot) => {
            *slot = item.clone();
            true
        }
        None => false,
    }
}

pub(crate) fn remove_by_id<T: Identified>(items: &mut Vec<T>, id: &EntityId) {
    items.retain(|existing| existing.entity_id() != id);
}

/// Replace `current` when it holds the same resource as `item`.
pub(crate) fn replace_current<T: Identified + Clone>(current: &mut Option<T>, item: &T) {
    if current.as_ref().is_some_and(|c| c.entity_id() == item.entity_id()) {
        *current = Some(item.clone());
    }
}

pub(crate) fn clear_current_if<T: Identified>(current: &mut Option<T>, id: &EntityId) {
    if current.as_ref().is_some_and(|c| c.entity_id() == id) {
        *current = None;
    }
}
