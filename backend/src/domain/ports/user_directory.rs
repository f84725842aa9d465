//! Port for resolving recipients and roles.
//!
//! The notification core does not own user records; it asks this port who a
//! user is (for authorisation and email lookup) and which users currently
//! hold a role (for fan-out targeting).

use async_trait::async_trait;

use crate::domain::{Role, UserAccount, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } =>
            "user directory connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "user directory query failed: {message}",
    }
}

/// Port for user lookup and role resolution.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch one user's directory record, or `None` when the id is unknown.
    async fn find(&self, user_id: &UserId) -> Result<Option<UserAccount>, UserDirectoryError>;

    /// All users currently holding `role`.
    ///
    /// Fan-out resolves its targets through this call; an empty result is a
    /// valid answer, not an error.
    async fn users_with_role(&self, role: Role) -> Result<Vec<UserAccount>, UserDirectoryError>;
}

/// Fixture implementation: an empty directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserDirectory;

#[async_trait]
impl UserDirectory for FixtureUserDirectory {
    async fn find(&self, _user_id: &UserId) -> Result<Option<UserAccount>, UserDirectoryError> {
        Ok(None)
    }

    async fn users_with_role(
        &self,
        _role: Role,
    ) -> Result<Vec<UserAccount>, UserDirectoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_lookup_returns_none() {
        let directory = FixtureUserDirectory;
        let result = directory
            .find(&UserId::random())
            .await
            .expect("fixture lookup succeeds");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn fixture_role_listing_is_empty() {
        let directory = FixtureUserDirectory;
        let members = directory
            .users_with_role(Role::Client)
            .await
            .expect("fixture role query succeeds");
        assert!(members.is_empty());
    }
}
