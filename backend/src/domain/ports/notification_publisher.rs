//! Port for pushing change events onto a recipient's realtime stream.
//!
//! Publishing is synchronous and infallible from the domain's point of view:
//! a recipient without an active subscription simply receives nothing, and a
//! slow subscriber's backlog is the transport's concern (the hub converts
//! overflow into a refresh signal).

use crate::domain::{NotificationEvent, UserId};

/// Port for fanning change events in to a user's live subscriptions.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationPublisher: Send + Sync {
    /// Push one event to every live subscription held by `user_id`.
    fn publish(&self, user_id: &UserId, event: NotificationEvent);
}

/// Fixture implementation that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpNotificationPublisher;

impl NotificationPublisher for NoOpNotificationPublisher {
    fn publish(&self, _user_id: &UserId, _event: NotificationEvent) {}
}
