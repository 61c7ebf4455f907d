use async_trait::async_trait;

use crate::identity::errors::AuthError;
use crate::principal::models::PrincipalId;
use crate::principal::models::User;

/// Port for admin moderation of user accounts.
#[async_trait]
pub trait PrincipalServicePort: Send + Sync + 'static {
    /// Retrieve user by unique identifier.
    ///
    /// # Errors
    /// * `PrincipalNotFound` - User does not exist
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn get_user(&self, id: &PrincipalId) -> Result<User, AuthError>;

    /// Deactivate a user. Its live tokens stop working on the next request.
    ///
    /// # Returns
    /// Updated user entity
    ///
    /// # Errors
    /// * `PrincipalNotFound` - User does not exist
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn deactivate_user(&self, id: &PrincipalId) -> Result<User, AuthError>;

    /// Reactivate a user.
    ///
    /// # Errors
    /// * `PrincipalNotFound` - User does not exist
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn activate_user(&self, id: &PrincipalId) -> Result<User, AuthError>;

    /// Grant creator status.
    ///
    /// # Errors
    /// * `PrincipalNotFound` - User does not exist
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn grant_creator(&self, id: &PrincipalId) -> Result<User, AuthError>;

    /// Revoke creator status.
    ///
    /// # Errors
    /// * `PrincipalNotFound` - User does not exist
    /// * `Validation` - User is not a creator
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn revoke_creator(&self, id: &PrincipalId) -> Result<User, AuthError>;
}
