use std::sync::Arc;

use async_trait::async_trait;

use crate::identity::errors::AuthError;
use crate::identity::ports::CredentialStore;
use crate::principal::models::PrincipalId;
use crate::principal::models::User;
use crate::principal::ports::PrincipalServicePort;

/// Domain service implementation for user moderation.
pub struct PrincipalService<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
}

impl<CS> PrincipalService<CS>
where
    CS: CredentialStore,
{
    pub fn new(store: Arc<CS>) -> Self {
        Self { store }
    }

    fn not_found(id: &PrincipalId) -> AuthError {
        AuthError::PrincipalNotFound(id.to_string())
    }
}

#[async_trait]
impl<CS> PrincipalServicePort for PrincipalService<CS>
where
    CS: CredentialStore,
{
    async fn get_user(&self, id: &PrincipalId) -> Result<User, AuthError> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    async fn deactivate_user(&self, id: &PrincipalId) -> Result<User, AuthError> {
        let user = self
            .store
            .set_user_active(id, false)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        tracing::info!(principal_id = %id, "User deactivated");
        Ok(user)
    }

    async fn activate_user(&self, id: &PrincipalId) -> Result<User, AuthError> {
        let user = self
            .store
            .set_user_active(id, true)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        tracing::info!(principal_id = %id, "User activated");
        Ok(user)
    }

    async fn grant_creator(&self, id: &PrincipalId) -> Result<User, AuthError> {
        let user = self
            .store
            .set_user_creator(id, true)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        tracing::info!(principal_id = %id, "Creator status granted");
        Ok(user)
    }

    async fn revoke_creator(&self, id: &PrincipalId) -> Result<User, AuthError> {
        let user = self.get_user(id).await?;
        if !user.is_creator {
            return Err(AuthError::Validation("User is not a creator".to_string()));
        }

        let user = self
            .store
            .set_user_creator(id, false)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        tracing::info!(principal_id = %id, "Creator status revoked");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::*;

    use super::*;
    use crate::identity::mocks::alice;
    use crate::identity::mocks::MockTestCredentialStore;

    #[tokio::test]
    async fn test_deactivate_user() {
        let mut store = MockTestCredentialStore::new();
        let mut user = alice();
        let user_id = user.id;
        user.is_active = false;

        store
            .expect_set_user_active()
            .with(eq(user_id), eq(false))
            .times(1)
            .returning(move |_, _| Ok(Some(user.clone())));

        let updated = PrincipalService::new(Arc::new(store))
            .deactivate_user(&user_id)
            .await
            .unwrap();

        assert!(!updated.is_active);
    }

    #[tokio::test]
    async fn test_moderating_unknown_user() {
        let mut store = MockTestCredentialStore::new();
        store.expect_set_user_active().returning(|_, _| Ok(None));

        let result = PrincipalService::new(Arc::new(store))
            .activate_user(&PrincipalId::new())
            .await;

        assert!(matches!(result, Err(AuthError::PrincipalNotFound(_))));
    }

    #[tokio::test]
    async fn test_grant_creator() {
        let mut store = MockTestCredentialStore::new();
        let mut user = alice();
        let user_id = user.id;
        user.is_creator = true;

        store
            .expect_set_user_creator()
            .with(eq(user_id), eq(true))
            .returning(move |_, _| Ok(Some(user.clone())));

        let updated = PrincipalService::new(Arc::new(store))
            .grant_creator(&user_id)
            .await
            .unwrap();

        assert!(updated.is_creator);
    }

    #[tokio::test]
    async fn test_revoke_creator_from_non_creator() {
        let mut store = MockTestCredentialStore::new();
        let user = alice();
        let user_id = user.id;

        store
            .expect_find_user()
            .returning(move |_| Ok(Some(user.clone())));
        store.expect_set_user_creator().times(0);

        let result = PrincipalService::new(Arc::new(store))
            .revoke_creator(&user_id)
            .await;

        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_revoke_creator() {
        let mut store = MockTestCredentialStore::new();
        let mut creator = alice();
        creator.is_creator = true;
        let user_id = creator.id;
        let mut revoked = creator.clone();
        revoked.is_creator = false;

        store
            .expect_find_user()
            .returning(move |_| Ok(Some(creator.clone())));
        store
            .expect_set_user_creator()
            .with(eq(user_id), eq(false))
            .times(1)
            .returning(move |_, _| Ok(Some(revoked.clone())));

        let updated = PrincipalService::new(Arc::new(store))
            .revoke_creator(&user_id)
            .await
            .unwrap();

        assert!(!updated.is_creator);
    }
}
