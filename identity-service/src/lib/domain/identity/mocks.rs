use async_trait::async_trait;
use auth::Authenticator;
use auth::IssuedAccess;
use auth::IssuedTokens;
use auth::PasswordHasher;
use auth::TokenLifetimes;
use mockall::mock;

use crate::identity::errors::AuthError;
use crate::identity::models::AuthProvider;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::ProviderId;
use crate::identity::ports::CredentialStore;
use crate::principal::models::Admin;
use crate::principal::models::EmailAddress;
use crate::principal::models::PrincipalId;
use crate::principal::models::User;

mock! {
    pub TestCredentialStore {}

    #[async_trait]
    impl CredentialStore for TestCredentialStore {
        async fn ensure_provider(&self, name: &str, provider_type: &str) -> Result<AuthProvider, AuthError>;
        async fn find_identity_by_email(&self, provider_name: &str, email: &EmailAddress) -> Result<Option<Identity>, AuthError>;
        async fn find_identity(&self, principal_id: &PrincipalId, provider_id: ProviderId) -> Result<Option<Identity>, AuthError>;
        async fn find_identity_by_refresh_token(&self, principal_id: &PrincipalId, refresh_token: &str) -> Result<Option<Identity>, AuthError>;
        async fn find_user(&self, id: &PrincipalId) -> Result<Option<User>, AuthError>;
        async fn find_admin(&self, id: &PrincipalId) -> Result<Option<Admin>, AuthError>;
        async fn find_admin_by_email(&self, email: &EmailAddress) -> Result<Option<Admin>, AuthError>;
        async fn create_admin(&self, admin: &Admin) -> Result<(), AuthError>;
        async fn create_user_with_identity(&self, user: &User, identity: &Identity) -> Result<(), AuthError>;
        async fn upsert_identity(&self, identity: &Identity) -> Result<Identity, AuthError>;
        async fn store_tokens(&self, id: &IdentityId, tokens: &IssuedTokens) -> Result<(), AuthError>;
        async fn store_access_token(&self, id: &IdentityId, access: &IssuedAccess) -> Result<(), AuthError>;
        async fn clear_tokens(&self, principal_id: &PrincipalId, provider_id: ProviderId) -> Result<(), AuthError>;
        async fn update_password_hash(&self, id: &IdentityId, password_hash: &str) -> Result<(), AuthError>;
        async fn set_user_active(&self, id: &PrincipalId, is_active: bool) -> Result<Option<User>, AuthError>;
        async fn set_user_creator(&self, id: &PrincipalId, is_creator: bool) -> Result<Option<User>, AuthError>;
    }
}

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Authenticator with cheap hashing parameters.
pub fn test_authenticator() -> Authenticator {
    Authenticator::new(TEST_SECRET, TokenLifetimes::default())
        .expect("Failed to build authenticator")
        .with_password_hasher(PasswordHasher::with_params(1024, 1, 1).expect("Invalid params"))
}

pub fn email_provider() -> AuthProvider {
    AuthProvider {
        id: ProviderId(1),
        name: "email".to_string(),
        provider_type: Some("credentials".to_string()),
        config: None,
    }
}

pub fn admin_provider() -> AuthProvider {
    AuthProvider {
        id: ProviderId(2),
        name: "admin".to_string(),
        provider_type: Some("credentials".to_string()),
        config: None,
    }
}

pub fn alice() -> User {
    User::new(EmailAddress::new("alice@example.com").unwrap(), Some("Alice".to_string()), None)
}
