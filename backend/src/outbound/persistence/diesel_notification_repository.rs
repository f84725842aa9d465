//! PostgreSQL-backed `NotificationRepository` implementation using Diesel ORM.
//!
//! Each operation checks a connection out of the shared pool, runs a single
//! statement, and converts rows back through the validated domain
//! constructors. Ordering and limits are applied here so callers always see
//! newest-first feeds.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{Notification, NotificationChannel, NotificationDraft, NotificationId, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewNotificationRow, NotificationRow};
use super::pool::{DbPool, PoolError};
use super::schema::notifications;

/// Diesel-backed implementation of the notification repository port.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> NotificationRepositoryError {
    map_pool_error(error, NotificationRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> NotificationRepositoryError {
    map_diesel_error(
        error,
        NotificationRepositoryError::query,
        NotificationRepositoryError::constraint,
        NotificationRepositoryError::connection,
    )
}

/// Convert a database row into a domain notification.
///
/// The channel column is free text at the storage level; a value outside the
/// known set means the row was written by something other than this adapter
/// and is surfaced as a query error rather than silently coerced.
fn row_to_notification(row: NotificationRow) -> Result<Notification, NotificationRepositoryError> {
    let NotificationRow {
        id,
        user_id,
        title,
        message,
        notification_type,
        read,
        created_at,
    } = row;

    let channel: NotificationChannel = notification_type.parse().map_err(|_| {
        NotificationRepositoryError::query(format!(
            "unrecognised notification type '{notification_type}' in row {id}"
        ))
    })?;

    Ok(Notification {
        id: NotificationId::from_uuid(id),
        user_id: UserId::from_uuid(user_id),
        title,
        message,
        channel,
        read,
        created_at,
    })
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn insert(
        &self,
        draft: &NotificationDraft,
    ) -> Result<Notification, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewNotificationRow {
            id: Uuid::new_v4(),
            user_id: *draft.user_id().as_uuid(),
            title: draft.title(),
            message: draft.message(),
            notification_type: draft.channel().as_str(),
        };

        // read and created_at come from column defaults; RETURNING hands back
        // the authoritative values in one round trip.
        let row = diesel::insert_into(notifications::table)
            .values(&new_row)
            .returning(NotificationRow::as_returning())
            .get_result::<NotificationRow>(&mut conn)
            .await
            .map_err(map_diesel)?;

        row_to_notification(row)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<NotificationRow> = notifications::table
            .filter(notifications::user_id.eq(user_id.as_uuid()))
            .order(notifications::created_at.desc())
            .limit(limit)
            .select(NotificationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_notification).collect()
    }

    async fn list_all(&self, limit: i64) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<NotificationRow> = notifications::table
            .order(notifications::created_at.desc())
            .limit(limit)
            .select(NotificationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_notification).collect()
    }

    async fn mark_read(
        &self,
        owner: &UserId,
        notification_id: &NotificationId,
    ) -> Result<bool, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        // Scoping by owner means a forged id belonging to another user is a
        // no-op, indistinguishable from an unknown id.
        let updated = diesel::update(
            notifications::table.filter(
                notifications::id
                    .eq(notification_id.as_uuid())
                    .and(notifications::user_id.eq(owner.as_uuid()))
                    .and(notifications::read.eq(false)),
            ),
        )
        .set(notifications::read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        Ok(updated > 0)
    }

    async fn mark_all_read_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let updated = diesel::update(
            notifications::table.filter(
                notifications::user_id
                    .eq(user_id.as_uuid())
                    .and(notifications::read.eq(false)),
            ),
        )
        .set(notifications::read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        Ok(updated as u64)
    }

    async fn delete(
        &self,
        notification_id: &NotificationId,
    ) -> Result<bool, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let deleted = diesel::delete(
            notifications::table.filter(notifications::id.eq(notification_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        Ok(deleted > 0)
    }
}
