//! PostgreSQL-backed `UserDirectory` implementation using Diesel ORM.
//!
//! Account rows are read-only from this adapter's point of view; membership
//! management happens elsewhere in the platform and this directory only
//! resolves recipients and role audiences.

use async_trait::async_trait;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{EmailAddress, Role, UserAccount, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the user directory port.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    /// Create a new directory with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> UserDirectoryError {
    map_pool_error(error, UserDirectoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> UserDirectoryError {
    map_diesel_error(
        error,
        UserDirectoryError::query,
        UserDirectoryError::query,
        UserDirectoryError::connection,
    )
}

/// Convert a database row into a validated domain account.
///
/// Email and role columns are revalidated on the way out; a row that fails
/// the domain constructors indicates corruption and is reported rather than
/// passed through.
fn row_to_account(row: UserRow) -> Result<UserAccount, UserDirectoryError> {
    let UserRow {
        id,
        display_name,
        email,
        role,
        ..
    } = row;

    let email = EmailAddress::new(email)
        .map_err(|err| UserDirectoryError::query(format!("account {id}: {err}")))?;
    let role: Role = role
        .parse()
        .map_err(|_| UserDirectoryError::query(format!("account {id}: unrecognised role")))?;

    Ok(UserAccount {
        id: UserId::from_uuid(id),
        display_name,
        email,
        role,
    })
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn find(&self, user_id: &UserId) -> Result<Option<UserAccount>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = users::table
            .filter(users::id.eq(user_id.as_uuid()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_account).transpose()
    }

    async fn users_with_role(&self, role: Role) -> Result<Vec<UserAccount>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<UserRow> = users::table
            .filter(users::role.eq(role.as_str()))
            .order(users::display_name.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_account).collect()
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion and error mapping coverage.

    use chrono::Utc;
    use rstest::{fixture, rstest};
    use uuid::Uuid;

    use super::*;

    #[fixture]
    fn valid_row() -> UserRow {
        let now = Utc::now();
        UserRow {
            id: Uuid::new_v4(),
            display_name: "Alex Morgan".into(),
            email: "alex@example.com".into(),
            role: "trainer".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool(PoolError::checkout("timed out"));

        assert!(matches!(repo_err, UserDirectoryError::Connection { .. }));
        assert!(repo_err.to_string().contains("timed out"));
    }

    #[rstest]
    fn row_conversion_produces_validated_account(valid_row: UserRow) {
        let account = row_to_account(valid_row).expect("valid row should convert");

        assert_eq!(account.role, Role::Trainer);
        assert_eq!(account.email.as_ref(), "alex@example.com");
    }

    #[rstest]
    fn row_conversion_rejects_malformed_email(mut valid_row: UserRow) {
        valid_row.email = "not-an-address".into();

        let error = row_to_account(valid_row).expect_err("malformed email should fail");
        assert!(matches!(error, UserDirectoryError::Query { .. }));
    }

    #[rstest]
    fn row_conversion_rejects_unknown_role(mut valid_row: UserRow) {
        valid_row.role = "janitor".into();

        let error = row_to_account(valid_row).expect_err("unknown role should fail");
        assert!(error.to_string().contains("unrecognised role"));
    }
}
