//! Notification entity and realtime change events.
//!
//! A notification always addresses exactly one recipient; role fan-out
//! creates independent rows rather than a shared broadcast row. Content is
//! immutable after creation and the `read` flag only ever moves from `false`
//! to `true`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::UserId;

/// Maximum accepted title length in characters.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum accepted message length in characters.
pub const MAX_MESSAGE_LEN: usize = 4000;

/// Validation errors raised when constructing a [`NotificationDraft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
    MessageTooLong { max: usize },
    UnknownChannel { value: String },
}

impl fmt::Display for NotificationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "notification title must not be empty"),
            Self::TitleTooLong { max } => {
                write!(f, "notification title must be at most {max} characters")
            }
            Self::MessageTooLong { max } => {
                write!(f, "notification message must be at most {max} characters")
            }
            Self::UnknownChannel { value } => {
                write!(f, "notification type must be app, email, or both (got {value})")
            }
        }
    }
}

impl std::error::Error for NotificationValidationError {}

/// Opaque notification identifier assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Delivery channel fixed at creation time.
///
/// `Email` and `Both` trigger the best-effort email side channel in addition
/// to the durable in-app record; the record itself is always persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    App,
    Email,
    Both,
}

impl NotificationChannel {
    /// Stable wire/storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Email => "email",
            Self::Both => "both",
        }
    }

    /// Whether this channel triggers the email side channel.
    pub fn includes_email(self) -> bool {
        matches!(self, Self::Email | Self::Both)
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = NotificationValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "app" => Ok(Self::App),
            "email" => Ok(Self::Email),
            "both" => Ok(Self::Both),
            other => Err(NotificationValidationError::UnknownChannel {
                value: other.to_owned(),
            }),
        }
    }
}

/// Validated input for creating one notification row.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    user_id: UserId,
    title: String,
    message: String,
    channel: NotificationChannel,
}

impl NotificationDraft {
    /// Check content rules without building a draft.
    ///
    /// Fan-out validates a broadcast template once through this before
    /// addressing per-user drafts.
    pub fn validate_content(
        title: &str,
        message: &str,
    ) -> Result<(), NotificationValidationError> {
        if title.trim().is_empty() {
            return Err(NotificationValidationError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(NotificationValidationError::TitleTooLong { max: MAX_TITLE_LEN });
        }
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(NotificationValidationError::MessageTooLong {
                max: MAX_MESSAGE_LEN,
            });
        }
        Ok(())
    }

    /// Validate content and build a draft addressed to `user_id`.
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        channel: NotificationChannel,
    ) -> Result<Self, NotificationValidationError> {
        let title = title.into();
        let message = message.into();
        Self::validate_content(&title, &message)?;

        Ok(Self {
            user_id,
            title,
            message,
            channel,
        })
    }

    /// Addressed recipient.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Notification title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Notification body.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Delivery channel.
    pub fn channel(&self) -> NotificationChannel {
        self.channel
    }

    /// Copy of this draft re-addressed to a different recipient.
    ///
    /// Used by role fan-out, which persists one independent row per matched
    /// user from a single validated template.
    pub fn readdressed_to(&self, user_id: UserId) -> Self {
        Self {
            user_id,
            title: self.title.clone(),
            message: self.message.clone(),
            channel: self.channel,
        }
    }
}

/// Persisted notification row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    #[serde(rename = "notificationType")]
    pub channel: NotificationChannel,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Change event pushed to a recipient's realtime subscription.
///
/// Inserts carry the full row so clients can prepend without a round trip.
/// Updates deliberately carry no payload: the subscriber re-fetches truth
/// instead of merging a possibly partial delta.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    Created(Notification),
    Refresh,
}
