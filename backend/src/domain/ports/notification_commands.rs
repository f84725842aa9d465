//! Driving ports consumed by the inbound adapters.
//!
//! HTTP handlers depend on these use-case traits rather than on the delivery
//! service directly, so the adapter stays testable with deterministic
//! doubles. Identity is always passed in explicitly; no operation reads an
//! ambient session.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    Error, Notification, NotificationChannel, NotificationDraft, NotificationId, Role, UserId,
};

/// Per-user failure recorded by a role fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FanOutFailure {
    /// Recipient whose insert (not email) failed.
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub user_id: UserId,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Aggregate outcome of a role fan-out.
///
/// Fan-out is non-atomic by design: each matched user gets an independent
/// insert, and one failure neither aborts nor rolls back the others.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FanOutReport {
    /// Role that was targeted.
    pub role: Role,
    /// Number of users matched by the role at resolution time.
    pub requested: usize,
    /// Ids of the rows that were persisted.
    pub delivered: Vec<NotificationId>,
    /// Recipients whose insert failed, with reasons.
    pub failed: Vec<FanOutFailure>,
}

impl FanOutReport {
    /// True when every matched user received a row.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Use-case port for notification mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationCommand: Send + Sync {
    /// Persist one notification and trigger its side effects.
    async fn send_to_user(&self, draft: NotificationDraft) -> Result<Notification, Error>;

    /// Fan a broadcast out to every user holding `role`.
    async fn send_to_role(
        &self,
        role: Role,
        title: String,
        message: String,
        channel: NotificationChannel,
    ) -> Result<FanOutReport, Error>;

    /// Mark one of `owner`'s notifications read; silent no-op on unknown ids.
    async fn mark_read(&self, owner: &UserId, id: &NotificationId) -> Result<(), Error>;

    /// Mark all of `owner`'s notifications read; returns rows changed.
    async fn mark_all_read(&self, owner: &UserId) -> Result<u64, Error>;

    /// Admin hard delete; returns whether a row existed.
    async fn delete(&self, id: &NotificationId) -> Result<bool, Error>;
}

/// Use-case port for notification reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationQuery: Send + Sync {
    /// The recent window of `user_id`'s feed, newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Notification>, Error>;

    /// The recent system-wide window (admin capability), newest first.
    async fn list_all(&self) -> Result<Vec<Notification>, Error>;
}

/// Fixture command double: every mutation succeeds without side effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationCommand;

#[async_trait]
impl NotificationCommand for FixtureNotificationCommand {
    async fn send_to_user(&self, draft: NotificationDraft) -> Result<Notification, Error> {
        Ok(Notification {
            id: NotificationId::random(),
            user_id: draft.user_id().clone(),
            title: draft.title().to_owned(),
            message: draft.message().to_owned(),
            channel: draft.channel(),
            read: false,
            created_at: chrono::Utc::now(),
        })
    }

    async fn send_to_role(
        &self,
        role: Role,
        _title: String,
        _message: String,
        _channel: NotificationChannel,
    ) -> Result<FanOutReport, Error> {
        Ok(FanOutReport {
            role,
            requested: 0,
            delivered: Vec::new(),
            failed: Vec::new(),
        })
    }

    async fn mark_read(&self, _owner: &UserId, _id: &NotificationId) -> Result<(), Error> {
        Ok(())
    }

    async fn mark_all_read(&self, _owner: &UserId) -> Result<u64, Error> {
        Ok(0)
    }

    async fn delete(&self, _id: &NotificationId) -> Result<bool, Error> {
        Ok(false)
    }
}

/// Fixture query double: the feed is always empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationQuery;

#[async_trait]
impl NotificationQuery for FixtureNotificationQuery {
    async fn list_for_user(&self, _user_id: &UserId) -> Result<Vec<Notification>, Error> {
        Ok(Vec::new())
    }

    async fn list_all(&self) -> Result<Vec<Notification>, Error> {
        Ok(Vec::new())
    }
}
