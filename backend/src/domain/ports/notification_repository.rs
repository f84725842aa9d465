//! Port for durable notification storage.
//!
//! The [`NotificationRepository`] trait is the authoritative persistence
//! contract for notification rows. Owner scoping is enforced here: reads are
//! always issued for an explicit `user_id`, never an ambient session, so the
//! store stays testable without a simulated global identity.

use async_trait::async_trait;

use crate::domain::{Notification, NotificationDraft, NotificationId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
        /// Insert violated a storage constraint (e.g. unknown recipient).
        Constraint { message: String } =>
            "notification insert violated a constraint: {message}",
    }
}

/// Default bounded window for a single user's feed.
pub const USER_FEED_LIMIT: i64 = 100;

/// Default bounded window for the admin system-wide listing.
pub const ADMIN_FEED_LIMIT: i64 = 200;

/// Port for notification storage and retrieval.
///
/// # Ordering
///
/// Listings return rows strictly descending by `created_at`; rows sharing a
/// timestamp keep their insertion order.
///
/// # Monotonic read state
///
/// No operation on this trait can set `read` back to `false`; mark
/// operations only flip unread rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist one draft, returning the stored row with generated id and
    /// creation timestamp.
    async fn insert(
        &self,
        draft: &NotificationDraft,
    ) -> Result<Notification, NotificationRepositoryError>;

    /// All notifications owned by `user_id`, newest first, capped at `limit`.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// System-wide listing (admin capability), newest first, capped at `limit`.
    async fn list_all(
        &self,
        limit: i64,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Mark one of `owner`'s rows read. Idempotent: returns `true` when a
    /// row actually flipped, `false` when the id was unknown, already read,
    /// or owned by someone else.
    async fn mark_read(
        &self,
        owner: &UserId,
        id: &NotificationId,
    ) -> Result<bool, NotificationRepositoryError>;

    /// Mark every unread row owned by `user_id` read; returns rows changed.
    async fn mark_all_read_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<u64, NotificationRepositoryError>;

    /// Hard-delete one row. Idempotent: returns whether a row existed.
    async fn delete(&self, id: &NotificationId) -> Result<bool, NotificationRepositoryError>;
}

/// Fixture implementation for tests that do not exercise persistence.
///
/// Stores nothing: listings are empty, mutations report no effect, and
/// inserts echo the draft back with a fresh id and the current time.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationRepository;

#[async_trait]
impl NotificationRepository for FixtureNotificationRepository {
    async fn insert(
        &self,
        draft: &NotificationDraft,
    ) -> Result<Notification, NotificationRepositoryError> {
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

    async fn list_for_user(
        &self,
        _user_id: &UserId,
        _limit: i64,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_all(
        &self,
        _limit: i64,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        Ok(Vec::new())
    }

    async fn mark_read(
        &self,
        _owner: &UserId,
        _id: &NotificationId,
    ) -> Result<bool, NotificationRepositoryError> {
        Ok(false)
    }

    async fn mark_all_read_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<u64, NotificationRepositoryError> {
        Ok(0)
    }

    async fn delete(&self, _id: &NotificationId) -> Result<bool, NotificationRepositoryError> {
        Ok(false)
    }
}
