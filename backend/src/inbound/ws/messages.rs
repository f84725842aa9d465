//! Wire-level frame definitions for the WebSocket adapter.
//!
//! Domain events become these payloads before serialisation. A created
//! notification ships its full row so clients can prepend without a round
//! trip; everything else collapses into a bare refresh signal telling the
//! client to re-fetch the feed.

use serde::Serialize;

use crate::domain::{Notification, NotificationEvent};

/// Outbound frame pushed to a connected client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    /// A new notification addressed to this user.
    #[serde(rename = "notification")]
    Notification { notification: Notification },
    /// Feed state changed without a payload; re-fetch from the store.
    #[serde(rename = "refresh")]
    Refresh,
}

impl From<NotificationEvent> for ServerFrame {
    fn from(event: NotificationEvent) -> Self {
        match event {
            NotificationEvent::Created(notification) => Self::Notification { notification },
            NotificationEvent::Refresh => Self::Refresh,
        }
    }
}
