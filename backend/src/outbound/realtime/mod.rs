//! In-process realtime bridge between the delivery service and WebSockets.
//!
//! The hub keeps one tokio broadcast channel per user with at least one
//! live subscription. Publishing is fire-and-forget: a user with no open
//! connection simply misses the event and recovers the state on their next
//! feed fetch, because the store, not the stream, is the source of truth.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::NotificationPublisher;
use crate::domain::{NotificationEvent, UserId};

/// Buffered events per subscriber before the stream reports lag.
///
/// A lagged subscriber receives a refresh signal instead of the missed
/// events, so the ceiling trades memory for refresh frequency only.
const CHANNEL_CAPACITY: usize = 32;

/// Per-user broadcast fan-in for notification events.
pub struct NotificationHub {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<NotificationEvent>>>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    /// Empty hub with no subscriptions.
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, broadcast::Sender<NotificationEvent>>> {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a subscription for `user_id`'s events.
    ///
    /// Multiple concurrent subscriptions for one user each receive every
    /// event (one user, several devices).
    pub fn subscribe(&self, user_id: &UserId) -> broadcast::Receiver<NotificationEvent> {
        let mut channels = self.lock();
        channels
            .entry(*user_id.as_uuid())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Number of users with a retained channel, for diagnostics.
    pub fn channel_count(&self) -> usize {
        self.lock().len()
    }
}

impl NotificationPublisher for NotificationHub {
    fn publish(&self, user_id: &UserId, event: NotificationEvent) {
        let mut channels = self.lock();
        let Some(sender) = channels.get(user_id.as_uuid()) else {
            debug!(user_id = %user_id, "no realtime subscribers; event dropped");
            return;
        };
        if sender.send(event).is_err() {
            // All receivers are gone; drop the channel rather than leak it.
            channels.remove(user_id.as_uuid());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Notification, NotificationChannel, NotificationId};
    use chrono::Utc;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    fn event_for(user_id: &UserId) -> NotificationEvent {
        NotificationEvent::Created(Notification {
            id: NotificationId::random(),
            user_id: user_id.clone(),
            title: "title".to_owned(),
            message: "message".to_owned(),
            channel: NotificationChannel::App,
            read: false,
            created_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let hub = NotificationHub::new();
        let user = UserId::random();
        let mut rx = hub.subscribe(&user);

        hub.publish(&user, event_for(&user));

        let received = rx.recv().await.expect("event arrives");
        assert!(matches!(received, NotificationEvent::Created(_)));
    }

    #[tokio::test]
    async fn events_are_scoped_to_the_recipient() {
        let hub = NotificationHub::new();
        let alice = UserId::random();
        let bob = UserId::random();
        let mut alice_rx = hub.subscribe(&alice);
        let mut bob_rx = hub.subscribe(&bob);

        hub.publish(&alice, event_for(&alice));

        assert!(alice_rx.recv().await.is_ok());
        assert!(matches!(bob_rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn every_device_of_one_user_receives_the_event() {
        let hub = NotificationHub::new();
        let user = UserId::random();
        let mut first = hub.subscribe(&user);
        let mut second = hub.subscribe(&user);

        hub.publish(&user, NotificationEvent::Refresh);

        assert_eq!(first.recv().await, Ok(NotificationEvent::Refresh));
        assert_eq!(second.recv().await, Ok(NotificationEvent::Refresh));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let hub = NotificationHub::new();
        let user = UserId::random();

        hub.publish(&user, event_for(&user));

        assert_eq!(hub.channel_count(), 0);
    }

    #[tokio::test]
    async fn dead_channels_are_pruned_on_publish() {
        let hub = NotificationHub::new();
        let user = UserId::random();
        let rx = hub.subscribe(&user);
        assert_eq!(hub.channel_count(), 1);

        drop(rx);
        hub.publish(&user, NotificationEvent::Refresh);

        assert_eq!(hub.channel_count(), 0);
    }

    #[tokio::test]
    async fn slow_subscribers_observe_lag_not_loss_of_order() {
        let hub = NotificationHub::new();
        let user = UserId::random();
        let mut rx = hub.subscribe(&user);

        for _ in 0..(CHANNEL_CAPACITY + 4) {
            hub.publish(&user, NotificationEvent::Refresh);
        }

        // The first recv on an overflowed channel reports lag; the session
        // layer maps this to a refresh signal.
        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(_))));
    }
}
