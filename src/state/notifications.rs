//! Notification inbox and unread badge count.

#[cfg(test)]
#[path = "notifications_test.rs"]
mod notifications_test;

use tokio::sync::watch;

use super::{Tracked, remove_by_id, replace_by_id, tracked};
use crate::error::ApiError;
use crate::net::notifications::NotificationService;
use crate::net::types::{EntityId, Notification};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationsState {
    pub notifications: Vec<Notification>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Tracked for NotificationsState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

impl NotificationsState {
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}

pub struct NotificationStore {
    service: NotificationService,
    state: watch::Sender<NotificationsState>,
}

impl NotificationStore {
    #[must_use]
    pub fn new(service: NotificationService) -> Self {
        let (state, _) = watch::channel(NotificationsState::default());
        Self { service, state }
    }

    #[must_use]
    pub fn snapshot(&self) -> NotificationsState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NotificationsState> {
        self.state.subscribe()
    }

    pub async fn fetch_notifications(&self) {
        self.load(self.service.list(), "Could not load notifications").await;
    }

    /// Replace the inbox with unread notifications only.
    pub async fn fetch_unread_notifications(&self) {
        self.load(self.service.unread(), "Could not load unread notifications").await;
    }

    async fn load(&self, op: impl Future<Output = Result<Vec<Notification>, ApiError>>, fallback: &str) {
        let _ = tracked(&self.state, fallback, op, |s, result| {
            if let Ok(notifications) = result {
                s.notifications.clone_from(notifications);
            }
        })
        .await;
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn mark_as_read(&self, id: &EntityId) -> Result<Notification, ApiError> {
        let fallback = format!("Could not mark notification {id} as read");
        tracked(&self.state, &fallback, self.service.mark_read(id), |s, result| {
            if let Ok(notification) = result {
                replace_by_id(&mut s.notifications, notification);
            }
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn mark_all_as_read(&self) -> Result<(), ApiError> {
        tracked(&self.state, "Could not mark all notifications as read", self.service.mark_all_read(), |s, result| {
            if result.is_ok() {
                for notification in &mut s.notifications {
                    notification.read = true;
                }
            }
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the service error after recording a user-facing message.
    pub async fn delete_notification(&self, id: &EntityId) -> Result<(), ApiError> {
        let fallback = format!("Could not delete notification {id}");
        tracked(&self.state, &fallback, self.service.delete(id), |s, result| {
            if result.is_ok() {
                remove_by_id(&mut s.notifications, id);
            }
        })
        .await
    }
}
