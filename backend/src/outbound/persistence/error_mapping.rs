//! Shared Diesel and pool error mapping for the persistence adapters.

use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure into a repository connection-error constructor.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel failures into query/constraint constructors.
///
/// Database detail stays in the debug log; the constructors receive a short
/// stable description so adapter errors never leak SQL to callers.
pub(crate) fn map_diesel_error<E, Q, K, C>(
    error: diesel::result::Error,
    query: Q,
    constraint: K,
    connection: C,
) -> E
where
    Q: FnOnce(&'static str) -> E,
    K: FnOnce(&'static str) -> E,
    C: FnOnce(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            constraint("duplicate row")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            constraint("unknown recipient")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection lost")
        }
        _ => query("database error"),
    }
}
