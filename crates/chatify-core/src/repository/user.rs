//! UserRepository trait definition.

use chatify_types::error::RepositoryError;
use chatify_types::status::PresenceStatus;
use chatify_types::user::{NewUser, User, UserId};

/// Repository trait for user lookup and presence persistence.
///
/// Identity fields belong to the external account service; the only write the
/// chat core performs on an existing user is `set_presence`.
pub trait UserRepository: Send + Sync {
    /// Get a user by id.
    fn find_user(
        &self,
        id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Find the user registered under a contact identifier.
    fn find_by_contact(
        &self,
        country_code: &str,
        contact_no: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Persist a presence transition and bump `updated_at`.
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    fn set_presence(
        &self,
        id: UserId,
        status: PresenceStatus,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Create a user (account-service stand-in for seeding and tests).
    ///
    /// Returns `RepositoryError::Conflict` if the contact identifier is taken.
    fn create_user(
        &self,
        user: &NewUser,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;
}
