//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on domain ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{NotificationCommand, NotificationQuery, UserDirectory};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub commands: Arc<dyn NotificationCommand>,
    pub queries: Arc<dyn NotificationQuery>,
    pub directory: Arc<dyn UserDirectory>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    pub fn new(
        commands: Arc<dyn NotificationCommand>,
        queries: Arc<dyn NotificationQuery>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            commands,
            queries,
            directory,
        }
    }
}
