//! Reviewer activity feed.
//!
//! Notifications are added only alongside a new account and leave only
//! through `clear`; there is no per-item removal.

use crate::model::notification::Notification;

#[derive(Debug, Default)]
pub struct FeedController {
    notifications: Vec<Notification>,
}

impl FeedController {
    pub fn from_records(notifications: Vec<Notification>) -> Self {
        Self { notifications }
    }

    /// Notifications, most-recent-first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub(crate) fn prepend(&mut self, notification: Notification) {
        self.notifications.insert(0, notification);
    }

    /// Empties the feed; returns how many notifications were dropped.
    pub(crate) fn clear(&mut self) -> usize {
        let cleared = self.notifications.len();
        self.notifications.clear();
        cleared
    }
}
