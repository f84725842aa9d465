//! Port for the email side channel.
//!
//! Email delivery is a best-effort secondary effect: the delivery service
//! logs failures from this port and never lets them disturb the already
//! persisted notification. There are no retries; a failed send is terminal
//! for that notification.

use async_trait::async_trait;

use crate::domain::{EmailAddress, NotificationId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by email sender adapters.
    pub enum EmailSenderError {
        /// The request never reached the provider (connect/timeout).
        Transport { message: String } =>
            "email transport failed: {message}",
        /// The provider rejected the request as malformed.
        Rejected { message: String } =>
            "email request rejected: {message}",
        /// The provider accepted the request but failed to send.
        Upstream { message: String } =>
            "email provider failed: {message}",
    }
}

/// Outbound email request handed to the side channel.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailRequest {
    pub to: EmailAddress,
    pub title: String,
    pub message: String,
    /// Correlating notification row, when one exists.
    pub notification_id: Option<NotificationId>,
}

/// Provider acknowledgement for a sent email.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmailReceipt {
    /// Provider-assigned message identifier, when the provider returns one.
    pub provider_id: Option<String>,
}

/// Port for dispatching a single outbound email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send one email; at-most-once, no retries.
    async fn send(&self, request: &EmailRequest) -> Result<EmailReceipt, EmailSenderError>;
}

/// Fixture implementation that acknowledges every request without sending.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEmailSender;

#[async_trait]
impl EmailSender for FixtureEmailSender {
    async fn send(&self, _request: &EmailRequest) -> Result<EmailReceipt, EmailSenderError> {
        Ok(EmailReceipt::default())
    }
}
