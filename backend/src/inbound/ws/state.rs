//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::outbound::realtime::NotificationHub;

/// Dependency bundle for the WebSocket entry point.
#[derive(Clone)]
pub struct WsState {
    pub hub: Arc<NotificationHub>,
}

impl WsState {
    /// Construct state around the shared hub.
    pub fn new(hub: Arc<NotificationHub>) -> Self {
        Self { hub }
    }
}
