use std::sync::Arc;

use auth::Authenticator;
use auth::TokenKind;
use chrono::Utc;

use crate::identity::context::IdentityContext;
use crate::identity::errors::AuthError;
use crate::identity::models::ProviderId;
use crate::identity::ports::CredentialStore;
use crate::principal::models::PrincipalId;
use crate::principal::models::PrincipalKind;

/// Validates bearer tokens against the credential store.
///
/// A token is accepted only if it decodes, is an access token, its principal
/// exists and is active, and it is the token currently stored for the
/// (principal, provider) identity.
pub struct RequestAuthenticator<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    authenticator: Arc<Authenticator>,
}

impl<CS> RequestAuthenticator<CS>
where
    CS: CredentialStore,
{
    pub fn new(store: Arc<CS>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            store,
            authenticator,
        }
    }

    /// Resolve a bearer token into the identity it belongs to.
    ///
    /// # Errors
    /// * `ExpiredToken` - Past its `exp`
    /// * `MalformedOrForged` - Bad signature or structure, not an access token,
    ///   or no provider claim
    /// * `IdentityNotFound` - Principal or identity gone, or the token is not the stored one
    /// * `PrincipalInactive` - Principal is deactivated
    /// * `StorageUnavailable` / `StorageError` - Database operation failed
    pub async fn authenticate(&self, token: &str) -> Result<IdentityContext, AuthError> {
        let claims = self.authenticator.decode(token)?;

        if claims.kind != TokenKind::Access {
            return Err(AuthError::MalformedOrForged(format!(
                "expected access token, got {:?}",
                claims.kind
            )));
        }

        let provider_id = claims
            .provider_id
            .map(ProviderId)
            .ok_or_else(|| AuthError::MalformedOrForged("missing provider_id".to_string()))?;

        let principal_id = PrincipalId::from_string(&claims.sub)
            .map_err(|e| AuthError::MalformedOrForged(e.to_string()))?;

        let kind = if claims.is_admin() {
            PrincipalKind::Admin
        } else {
            PrincipalKind::User
        };

        let context = match kind {
            PrincipalKind::Admin => {
                let admin = self
                    .store
                    .find_admin(&principal_id)
                    .await?
                    .ok_or_else(|| AuthError::IdentityNotFound(principal_id.to_string()))?;
                IdentityContext::for_admin(&admin, provider_id)
            }
            PrincipalKind::User => {
                let user = self
                    .store
                    .find_user(&principal_id)
                    .await?
                    .ok_or_else(|| AuthError::IdentityNotFound(principal_id.to_string()))?;
                IdentityContext::for_user(&user, provider_id)
            }
        };

        if !context.is_active {
            return Err(AuthError::PrincipalInactive(principal_id.to_string()));
        }

        let identity = self
            .store
            .find_identity(&principal_id, provider_id)
            .await?
            .filter(|identity| identity.principal_kind == kind)
            .ok_or_else(|| AuthError::IdentityNotFound(principal_id.to_string()))?;

        if !identity.accepts_access_token(token, Utc::now()) {
            return Err(AuthError::IdentityNotFound(format!(
                "{}: token is not the current session",
                principal_id
            )));
        }

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use auth::Claims;
    use auth::IssuedTokens;
    use mockall::predicate::*;

    use super::*;
    use crate::identity::mocks::alice;
    use crate::identity::mocks::test_authenticator;
    use crate::identity::mocks::MockTestCredentialStore;
    use crate::identity::models::Identity;
    use crate::principal::models::Admin;
    use crate::principal::models::EmailAddress;
    use crate::principal::models::Role;
    use crate::principal::models::User;

    fn request_authenticator(
        store: MockTestCredentialStore,
    ) -> RequestAuthenticator<MockTestCredentialStore> {
        RequestAuthenticator::new(Arc::new(store), Arc::new(test_authenticator()))
    }

    fn user_session(user: &User) -> (IssuedTokens, Identity) {
        let tokens = test_authenticator()
            .issue_tokens(user.id, user.email.as_str(), 1, false)
            .unwrap();
        let identity = Identity::with_tokens(
            user.id,
            PrincipalKind::User,
            ProviderId(1),
            &user.email,
            None,
            &tokens,
        );
        (tokens, identity)
    }

    #[tokio::test]
    async fn test_authenticate_current_session() {
        let mut store = MockTestCredentialStore::new();
        let mut user = alice();
        user.is_creator = true;
        let user_id = user.id;
        let (tokens, identity) = user_session(&user);

        store
            .expect_find_user()
            .with(eq(user_id))
            .returning(move |_| Ok(Some(user.clone())));
        store
            .expect_find_identity()
            .with(eq(user_id), eq(ProviderId(1)))
            .returning(move |_, _| Ok(Some(identity.clone())));

        let context = request_authenticator(store)
            .authenticate(&tokens.access_token)
            .await
            .unwrap();

        assert_eq!(context.principal_id, user_id);
        assert_eq!(context.provider_id, ProviderId(1));
        assert_eq!(context.role, Role::Creator);
        assert_eq!(context.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_authenticate_admin_session() {
        let mut store = MockTestCredentialStore::new();
        let admin = Admin::new(EmailAddress::new("root@example.com").unwrap(), None, "hash".to_string());
        let tokens = test_authenticator()
            .issue_tokens(admin.id, admin.email.as_str(), 2, true)
            .unwrap();
        let identity = Identity::with_tokens(
            admin.id,
            PrincipalKind::Admin,
            ProviderId(2),
            &admin.email,
            None,
            &tokens,
        );

        store
            .expect_find_admin()
            .returning(move |_| Ok(Some(admin.clone())));
        store.expect_find_user().times(0);
        store
            .expect_find_identity()
            .returning(move |_, _| Ok(Some(identity.clone())));

        let context = request_authenticator(store)
            .authenticate(&tokens.access_token)
            .await
            .unwrap();

        assert!(context.is_admin());
    }

    #[tokio::test]
    async fn test_logged_out_session_rejected() {
        let mut store = MockTestCredentialStore::new();
        let user = alice();
        let (tokens, mut identity) = user_session(&user);
        identity.access_token = None;
        identity.refresh_token = None;
        identity.token_expires_at = None;

        store
            .expect_find_user()
            .returning(move |_| Ok(Some(user.clone())));
        store
            .expect_find_identity()
            .returning(move |_, _| Ok(Some(identity.clone())));

        let result = request_authenticator(store)
            .authenticate(&tokens.access_token)
            .await;

        assert!(matches!(result, Err(AuthError::IdentityNotFound(_))));
    }

    #[tokio::test]
    async fn test_stored_token_mismatch_rejected() {
        let mut store = MockTestCredentialStore::new();
        let user = alice();
        let (tokens, mut identity) = user_session(&user);
        identity.access_token = Some("some-other-token".to_string());

        store
            .expect_find_user()
            .returning(move |_| Ok(Some(user.clone())));
        store
            .expect_find_identity()
            .returning(move |_, _| Ok(Some(identity.clone())));

        let result = request_authenticator(store)
            .authenticate(&tokens.access_token)
            .await;

        assert!(matches!(result, Err(AuthError::IdentityNotFound(_))));
    }

    #[tokio::test]
    async fn test_deactivated_user_rejected() {
        let mut store = MockTestCredentialStore::new();
        let mut user = alice();
        user.is_active = false;
        let (tokens, _) = user_session(&user);

        store
            .expect_find_user()
            .returning(move |_| Ok(Some(user.clone())));
        store.expect_find_identity().times(0);

        let result = request_authenticator(store)
            .authenticate(&tokens.access_token)
            .await;

        assert!(matches!(result, Err(AuthError::PrincipalInactive(_))));
    }

    #[tokio::test]
    async fn test_deleted_user_rejected() {
        let mut store = MockTestCredentialStore::new();
        let (tokens, _) = user_session(&alice());

        store.expect_find_user().returning(|_| Ok(None));

        let result = request_authenticator(store)
            .authenticate(&tokens.access_token)
            .await;

        assert!(matches!(result, Err(AuthError::IdentityNotFound(_))));
    }

    #[tokio::test]
    async fn test_refresh_token_not_accepted_as_access() {
        let mut store = MockTestCredentialStore::new();
        store.expect_find_user().times(0);
        let (tokens, _) = user_session(&alice());

        let result = request_authenticator(store)
            .authenticate(&tokens.refresh_token)
            .await;

        assert!(matches!(result, Err(AuthError::MalformedOrForged(_))));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let store = MockTestCredentialStore::new();
        let user = alice();
        let claims = Claims::access(
            user.id,
            user.email.as_str(),
            1,
            false,
            Utc::now() - chrono::Duration::hours(1),
            chrono::Duration::minutes(30),
        )
        .unwrap();
        let token = test_authenticator().codec().encode(&claims).unwrap();

        let result = request_authenticator(store).authenticate(&token).await;

        assert_eq!(result, Err(AuthError::ExpiredToken));
    }

    #[tokio::test]
    async fn test_forged_token_rejected() {
        let store = MockTestCredentialStore::new();
        let forger = auth::Authenticator::new(
            b"another-secret-key-at-least-32-bytes!!",
            auth::TokenLifetimes::default(),
        )
        .unwrap();
        let token = forger
            .issue_tokens(PrincipalId::new(), "mallory@example.com", 1, true)
            .unwrap()
            .access_token;

        let result = request_authenticator(store).authenticate(&token).await;

        assert!(matches!(result, Err(AuthError::MalformedOrForged(_))));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let mut store = MockTestCredentialStore::new();
        let (tokens, _) = user_session(&alice());

        store
            .expect_find_user()
            .returning(|_| Err(AuthError::StorageUnavailable("connection refused".to_string())));

        let result = request_authenticator(store)
            .authenticate(&tokens.access_token)
            .await;

        assert!(matches!(result, Err(AuthError::StorageUnavailable(_))));
    }
}
