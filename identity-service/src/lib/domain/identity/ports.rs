use async_trait::async_trait;
use auth::IssuedAccess;
use auth::IssuedTokens;

use crate::identity::context::IdentityContext;
use crate::identity::errors::AuthError;
use crate::identity::models::AuthProvider;
use crate::identity::models::ChangePasswordCommand;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::PrincipalProfile;
use crate::identity::models::ProviderId;
use crate::identity::models::SessionGrant;
use crate::identity::models::SignInCommand;
use crate::identity::models::SignUpCommand;
use crate::principal::models::Admin;
use crate::principal::models::EmailAddress;
use crate::principal::models::PlainPassword;
use crate::principal::models::PrincipalId;
use crate::principal::models::User;

/// Port for session lifecycle operations.
#[async_trait]
pub trait SessionServicePort: Send + Sync + 'static {
    /// Register a new user under the email provider and open a session.
    ///
    /// # Arguments
    /// * `command` - Validated email, password and optional profile fields
    ///
    /// # Returns
    /// New user, provider and token pair
    ///
    /// # Errors
    /// * `DuplicateIdentity` - Email already registered with the email provider
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn sign_up(&self, command: SignUpCommand) -> Result<SessionGrant, AuthError>;

    /// Open a user session with email + password.
    ///
    /// # Arguments
    /// * `command` - Email and candidate password
    ///
    /// # Returns
    /// User, provider and a fresh token pair replacing the stored one
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, no password credential, or mismatch
    /// * `AccountDisabled` - User is deactivated
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn sign_in(&self, command: SignInCommand) -> Result<SessionGrant, AuthError>;

    /// Open an admin session with email + password.
    ///
    /// # Arguments
    /// * `command` - Email and candidate password
    ///
    /// # Returns
    /// Admin, the admin provider and a token pair with the admin lifetime
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown admin email or mismatch
    /// * `AccountDisabled` - Admin is deactivated
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn admin_sign_in(&self, command: SignInCommand) -> Result<SessionGrant, AuthError>;

    /// Exchange a refresh token for a new access token.
    ///
    /// # Arguments
    /// * `refresh_token` - Token previously issued as the refresh half of a pair
    ///
    /// # Returns
    /// New access token, which replaces the stored one
    ///
    /// # Errors
    /// * `InvalidRefreshToken` - Undecodable, not a refresh token, or not the stored one
    /// * `PrincipalInactive` - Backing user or admin is gone or deactivated
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn refresh(&self, refresh_token: &str) -> Result<IssuedAccess, AuthError>;

    /// Close the session of one identity.
    ///
    /// # Arguments
    /// * `principal_id` - Principal of the session
    /// * `provider_id` - Provider of the session
    ///
    /// # Returns
    /// Unit, also when no such identity exists
    ///
    /// # Errors
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn logout(
        &self,
        principal_id: &PrincipalId,
        provider_id: ProviderId,
    ) -> Result<(), AuthError>;

    /// Replace the password of the caller's identity.
    ///
    /// # Arguments
    /// * `context` - Authenticated caller
    /// * `command` - Old password and validated new password
    ///
    /// # Returns
    /// Unit on success; issued tokens stay valid
    ///
    /// # Errors
    /// * `Forbidden` - Caller is an admin
    /// * `IdentityNotFound` - Caller's identity is gone
    /// * `Validation` - Old password does not verify, or no password credential
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn change_password(
        &self,
        context: &IdentityContext,
        command: ChangePasswordCommand,
    ) -> Result<(), AuthError>;

    /// Load the user or admin behind an authenticated request.
    ///
    /// # Errors
    /// * `IdentityNotFound` - Principal row is gone
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn current_principal(
        &self,
        context: &IdentityContext,
    ) -> Result<PrincipalProfile, AuthError>;

    /// Create an admin account unless one with this email already exists.
    ///
    /// # Returns
    /// The existing or newly created admin
    ///
    /// # Errors
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn provision_admin(
        &self,
        email: EmailAddress,
        password: PlainPassword,
        name: Option<String>,
    ) -> Result<Admin, AuthError>;
}

/// Persistence of principals, providers and identities.
///
/// Lookups return `Ok(None)` for missing rows; only storage failures are errors.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Get a provider by name, creating it when missing.
    ///
    /// # Errors
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn ensure_provider(
        &self,
        name: &str,
        provider_type: &str,
    ) -> Result<AuthProvider, AuthError>;

    /// Identity registered with `email` under the provider named `provider_name`.
    async fn find_identity_by_email(
        &self,
        provider_name: &str,
        email: &EmailAddress,
    ) -> Result<Option<Identity>, AuthError>;

    /// Identity of a principal under a provider.
    async fn find_identity(
        &self,
        principal_id: &PrincipalId,
        provider_id: ProviderId,
    ) -> Result<Option<Identity>, AuthError>;

    /// Identity of a principal whose stored refresh token is exactly `refresh_token`.
    async fn find_identity_by_refresh_token(
        &self,
        principal_id: &PrincipalId,
        refresh_token: &str,
    ) -> Result<Option<Identity>, AuthError>;

    async fn find_user(&self, id: &PrincipalId) -> Result<Option<User>, AuthError>;

    async fn find_admin(&self, id: &PrincipalId) -> Result<Option<Admin>, AuthError>;

    async fn find_admin_by_email(&self, email: &EmailAddress) -> Result<Option<Admin>, AuthError>;

    /// Persist a new admin.
    ///
    /// # Errors
    /// * `DuplicateIdentity` - Email already used by another admin
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    async fn create_admin(&self, admin: &Admin) -> Result<(), AuthError>;

    /// Persist a new user together with its first identity, atomically.
    ///
    /// # Errors
    /// * `DuplicateIdentity` - Identity constraints violated (concurrent sign-up)
    /// * `StorageUnavailable` / `StorageError` - Database operation failed; nothing is written
    async fn create_user_with_identity(
        &self,
        user: &User,
        identity: &Identity,
    ) -> Result<(), AuthError>;

    /// Insert an identity, or overwrite the token pair of the existing
    /// (principal, provider) identity.
    ///
    /// # Returns
    /// The stored identity
    async fn upsert_identity(&self, identity: &Identity) -> Result<Identity, AuthError>;

    /// Overwrite the stored token pair and expiry.
    async fn store_tokens(&self, id: &IdentityId, tokens: &IssuedTokens) -> Result<(), AuthError>;

    /// Overwrite the stored access token and expiry, keeping the refresh token.
    async fn store_access_token(
        &self,
        id: &IdentityId,
        access: &IssuedAccess,
    ) -> Result<(), AuthError>;

    /// Null the stored token pair and expiry. No-op when the identity is absent.
    async fn clear_tokens(
        &self,
        principal_id: &PrincipalId,
        provider_id: ProviderId,
    ) -> Result<(), AuthError>;

    async fn update_password_hash(
        &self,
        id: &IdentityId,
        password_hash: &str,
    ) -> Result<(), AuthError>;

    /// Set the active flag of a user.
    ///
    /// # Returns
    /// The updated user, or `None` if it does not exist
    async fn set_user_active(
        &self,
        id: &PrincipalId,
        is_active: bool,
    ) -> Result<Option<User>, AuthError>;

    /// Set the creator flag of a user.
    ///
    /// # Returns
    /// The updated user, or `None` if it does not exist
    async fn set_user_creator(
        &self,
        id: &PrincipalId,
        is_creator: bool,
    ) -> Result<Option<User>, AuthError>;
}
