use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::IssuedAccess;
use auth::TokenKind;
use chrono::Utc;

use crate::identity::context::IdentityContext;
use crate::identity::errors::AuthError;
use crate::identity::models::ChangePasswordCommand;
use crate::identity::models::Identity;
use crate::identity::models::PrincipalProfile;
use crate::identity::models::ProviderId;
use crate::identity::models::SessionGrant;
use crate::identity::models::SignInCommand;
use crate::identity::models::SignUpCommand;
use crate::identity::models::ADMIN_PROVIDER;
use crate::identity::models::CREDENTIALS_PROVIDER_TYPE;
use crate::identity::models::EMAIL_PROVIDER;
use crate::identity::ports::CredentialStore;
use crate::identity::ports::SessionServicePort;
use crate::principal::models::Admin;
use crate::principal::models::EmailAddress;
use crate::principal::models::PlainPassword;
use crate::principal::models::PrincipalId;
use crate::principal::models::PrincipalKind;
use crate::principal::models::User;

/// Domain service implementation for session operations.
///
/// Password hashing runs on the blocking pool; everything else is plain
/// store access through the injected `CredentialStore`.
pub struct SessionService<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    authenticator: Arc<Authenticator>,
}

impl<CS> SessionService<CS>
where
    CS: CredentialStore,
{
    /// Create a new session service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential persistence implementation
    /// * `authenticator` - Password hasher and token issuer
    pub fn new(store: Arc<CS>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            store,
            authenticator,
        }
    }

    async fn hash_password(&self, password: PlainPassword) -> Result<String, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);
        tokio::task::spawn_blocking(move || authenticator.hash_password(password.as_str()))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    async fn verify_password(&self, password: String, stored_hash: String) -> Result<bool, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);
        tokio::task::spawn_blocking(move || authenticator.verify_password(&password, &stored_hash))
            .await
            .map_err(|e| {
                AuthError::Internal(format!("Password verification task failed: {}", e))
            })?
            .map_err(AuthError::from)
    }
}

#[async_trait]
impl<CS> SessionServicePort for SessionService<CS>
where
    CS: CredentialStore,
{
    async fn sign_up(&self, command: SignUpCommand) -> Result<SessionGrant, AuthError> {
        let provider = self
            .store
            .ensure_provider(EMAIL_PROVIDER, CREDENTIALS_PROVIDER_TYPE)
            .await?;

        if self
            .store
            .find_identity_by_email(EMAIL_PROVIDER, &command.email)
            .await?
            .is_some()
        {
            tracing::info!(email = %command.email, "Sign-up rejected: email already registered");
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = self.hash_password(command.password).await?;
        let user = User::new(command.email, command.name, command.phone_no);

        let tokens = self
            .authenticator
            .issue_tokens(user.id, user.email.as_str(), provider.id.0, false)?;

        let mut identity = Identity::with_tokens(
            user.id,
            PrincipalKind::User,
            provider.id,
            &user.email,
            Some(password_hash),
            &tokens,
        );
        identity.phone_no = user.phone_no.clone();

        self.store.create_user_with_identity(&user, &identity).await?;

        tracing::info!(
            principal_id = %user.id,
            provider_id = %provider.id,
            "User signed up"
        );

        Ok(SessionGrant {
            principal: PrincipalProfile::User(user),
            provider_id: provider.id,
            tokens,
        })
    }

    async fn sign_in(&self, command: SignInCommand) -> Result<SessionGrant, AuthError> {
        let identity = self
            .store
            .find_identity_by_email(EMAIL_PROVIDER, &command.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let stored_hash = identity
            .password_hash
            .clone()
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(command.password, stored_hash).await? {
            tracing::warn!(principal_id = %identity.principal_id, "Sign-in rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .store
            .find_user(&identity.principal_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            tracing::warn!(principal_id = %user.id, "Sign-in rejected: account deactivated");
            return Err(AuthError::AccountDisabled);
        }

        let tokens = self.authenticator.issue_tokens(
            user.id,
            user.email.as_str(),
            identity.provider_id.0,
            false,
        )?;
        self.store.store_tokens(&identity.id, &tokens).await?;

        tracing::info!(
            principal_id = %user.id,
            provider_id = %identity.provider_id,
            "User signed in"
        );

        Ok(SessionGrant {
            principal: PrincipalProfile::User(user),
            provider_id: identity.provider_id,
            tokens,
        })
    }

    async fn admin_sign_in(&self, command: SignInCommand) -> Result<SessionGrant, AuthError> {
        let admin = self
            .store
            .find_admin_by_email(&command.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .verify_password(command.password, admin.password_hash.clone())
            .await?
        {
            tracing::warn!(principal_id = %admin.id, "Admin sign-in rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        if !admin.is_active {
            tracing::warn!(principal_id = %admin.id, "Admin sign-in rejected: account deactivated");
            return Err(AuthError::AccountDisabled);
        }

        let provider = self
            .store
            .ensure_provider(ADMIN_PROVIDER, CREDENTIALS_PROVIDER_TYPE)
            .await?;

        let tokens = self
            .authenticator
            .issue_tokens(admin.id, admin.email.as_str(), provider.id.0, true)?;

        let identity = Identity::with_tokens(
            admin.id,
            PrincipalKind::Admin,
            provider.id,
            &admin.email,
            None,
            &tokens,
        );
        self.store.upsert_identity(&identity).await?;

        tracing::info!(
            principal_id = %admin.id,
            provider_id = %provider.id,
            "Admin signed in"
        );

        Ok(SessionGrant {
            principal: PrincipalProfile::Admin(admin),
            provider_id: provider.id,
            tokens,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<IssuedAccess, AuthError> {
        let claims = self.authenticator.decode(refresh_token).map_err(|e| {
            tracing::warn!(error = %e, "Refresh rejected: token did not decode");
            AuthError::InvalidRefreshToken
        })?;

        if claims.kind != TokenKind::Refresh {
            tracing::warn!(kind = ?claims.kind, "Refresh rejected: not a refresh token");
            return Err(AuthError::InvalidRefreshToken);
        }

        let principal_id =
            PrincipalId::from_string(&claims.sub).map_err(|_| AuthError::InvalidRefreshToken)?;

        let identity = self
            .store
            .find_identity_by_refresh_token(&principal_id, refresh_token)
            .await?
            .filter(|identity| identity.holds_refresh_token(refresh_token))
            .ok_or_else(|| {
                tracing::warn!(principal_id = %principal_id, "Refresh rejected: no matching session");
                AuthError::InvalidRefreshToken
            })?;

        let email = match identity.principal_kind {
            PrincipalKind::User => self
                .store
                .find_user(&principal_id)
                .await?
                .filter(|user| user.is_active)
                .map(|user| user.email),
            PrincipalKind::Admin => self
                .store
                .find_admin(&principal_id)
                .await?
                .filter(|admin| admin.is_active)
                .map(|admin| admin.email),
        }
        .ok_or_else(|| AuthError::PrincipalInactive(principal_id.to_string()))?;

        let access = self.authenticator.issue_access(
            principal_id,
            email.as_str(),
            identity.provider_id.0,
            identity.principal_kind.is_admin(),
        )?;
        self.store.store_access_token(&identity.id, &access).await?;

        tracing::info!(principal_id = %principal_id, "Access token refreshed");

        Ok(access)
    }

    async fn logout(
        &self,
        principal_id: &PrincipalId,
        provider_id: ProviderId,
    ) -> Result<(), AuthError> {
        self.store.clear_tokens(principal_id, provider_id).await?;

        tracing::info!(principal_id = %principal_id, provider_id = %provider_id, "Logged out");

        Ok(())
    }

    async fn change_password(
        &self,
        context: &IdentityContext,
        command: ChangePasswordCommand,
    ) -> Result<(), AuthError> {
        if context.is_admin() {
            return Err(AuthError::Forbidden);
        }

        let identity = self
            .store
            .find_identity(&context.principal_id, context.provider_id)
            .await?
            .ok_or_else(|| AuthError::IdentityNotFound(context.principal_id.to_string()))?;

        let stored_hash = identity.password_hash.clone().ok_or_else(|| {
            AuthError::Validation("Account has no password credential".to_string())
        })?;

        if !self
            .verify_password(command.old_password, stored_hash)
            .await?
        {
            return Err(AuthError::Validation("Old password is incorrect".to_string()));
        }

        let new_hash = self.hash_password(command.new_password).await?;
        self.store.update_password_hash(&identity.id, &new_hash).await?;

        tracing::info!(principal_id = %context.principal_id, "Password changed");

        Ok(())
    }

    async fn current_principal(
        &self,
        context: &IdentityContext,
    ) -> Result<PrincipalProfile, AuthError> {
        let profile = if context.is_admin() {
            self.store
                .find_admin(&context.principal_id)
                .await?
                .map(PrincipalProfile::Admin)
        } else {
            self.store
                .find_user(&context.principal_id)
                .await?
                .map(PrincipalProfile::User)
        };

        profile.ok_or_else(|| AuthError::IdentityNotFound(context.principal_id.to_string()))
    }

    async fn provision_admin(
        &self,
        email: EmailAddress,
        password: PlainPassword,
        name: Option<String>,
    ) -> Result<Admin, AuthError> {
        if let Some(existing) = self.store.find_admin_by_email(&email).await? {
            tracing::debug!(email = %email, "Admin already provisioned");
            return Ok(existing);
        }

        let password_hash = self.hash_password(password).await?;
        let admin = Admin::new(email, name, password_hash);
        self.store.create_admin(&admin).await?;

        tracing::info!(principal_id = %admin.id, email = %admin.email, "Admin provisioned");

        Ok(admin)
    }
}
