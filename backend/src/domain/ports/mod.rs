//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod email_sender;
mod notification_commands;
mod notification_publisher;
mod notification_repository;
mod user_directory;

#[cfg(test)]
pub use email_sender::MockEmailSender;
pub use email_sender::{
    EmailReceipt, EmailRequest, EmailSender, EmailSenderError, FixtureEmailSender,
};
#[cfg(test)]
pub use notification_commands::{MockNotificationCommand, MockNotificationQuery};
pub use notification_commands::{
    FanOutFailure, FanOutReport, FixtureNotificationCommand, FixtureNotificationQuery,
    NotificationCommand, NotificationQuery,
};
#[cfg(test)]
pub use notification_publisher::MockNotificationPublisher;
pub use notification_publisher::{NoOpNotificationPublisher, NotificationPublisher};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{
    ADMIN_FEED_LIMIT, FixtureNotificationRepository, NotificationRepository,
    NotificationRepositoryError, USER_FEED_LIMIT,
};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{FixtureUserDirectory, UserDirectory, UserDirectoryError};
