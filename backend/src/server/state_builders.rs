//! Builders for HTTP state ports backed by real adapters or fixtures.

use std::sync::Arc;

use actix_web::web;
use tracing::info;

use crate::domain::NotificationDeliveryService;
use crate::domain::ports::{
    EmailSender, FixtureEmailSender, FixtureNotificationCommand, FixtureNotificationQuery,
    FixtureUserDirectory, NotificationCommand, NotificationPublisher, NotificationQuery,
    UserDirectory,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::email::HttpEmailSender;
use crate::outbound::persistence::{DieselNotificationRepository, DieselUserDirectory};

use super::ServerConfig;

/// Select the email side channel for the delivery service.
///
/// Fixture acknowledgement keeps the delivery path exercised in environments
/// without an email function; persisted notifications are unaffected either
/// way.
fn build_email_sender(config: &ServerConfig) -> std::io::Result<Arc<dyn EmailSender>> {
    match &config.email_endpoint {
        Some(endpoint) => {
            let sender = HttpEmailSender::new(endpoint.clone())
                .map_err(|e| std::io::Error::other(format!("email client build failed: {e}")))?;
            Ok(Arc::new(sender))
        }
        None => {
            info!("no email endpoint configured; using fixture email sender");
            Ok(Arc::new(FixtureEmailSender))
        }
    }
}

/// Build the shared HTTP state from configured ports and fixture fallbacks.
///
/// The same delivery service instance backs both the command and query ports
/// so that reads and writes always go through one repository handle.
pub(super) fn build_http_state(
    config: &ServerConfig,
    publisher: Arc<dyn NotificationPublisher>,
) -> std::io::Result<web::Data<HttpState>> {
    let state = match &config.db_pool {
        Some(pool) => {
            let repository = Arc::new(DieselNotificationRepository::new(pool.clone()));
            let directory = Arc::new(DieselUserDirectory::new(pool.clone()));
            let email = build_email_sender(config)?;
            let service = Arc::new(NotificationDeliveryService::new(
                repository,
                directory.clone(),
                email,
                publisher,
            ));
            HttpState::new(
                service.clone() as Arc<dyn NotificationCommand>,
                service as Arc<dyn NotificationQuery>,
                directory as Arc<dyn UserDirectory>,
            )
        }
        None => {
            info!("no database pool configured; serving fixture notification ports");
            HttpState::new(
                Arc::new(FixtureNotificationCommand),
                Arc::new(FixtureNotificationQuery),
                Arc::new(FixtureUserDirectory),
            )
        }
    };

    Ok(web::Data::new(state))
}
