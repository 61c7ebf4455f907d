use async_trait::async_trait;
use auth::IssuedAccess;
use auth::IssuedTokens;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::identity::errors::AuthError;
use crate::identity::models::AuthProvider;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::ProviderId;
use crate::identity::ports::CredentialStore;
use crate::principal::models::Admin;
use crate::principal::models::EmailAddress;
use crate::principal::models::PrincipalId;
use crate::principal::models::PrincipalKind;
use crate::principal::models::User;

const USER_COLUMNS: &str = "id, email, name, phone_no, profile_pic, is_active, is_creator, \
                            created_at, updated_at";

const ADMIN_COLUMNS: &str = "id, name, email, password_hash, is_active, created_at, updated_at";

const IDENTITY_COLUMNS: &str = "i.id, i.principal_id, i.principal_kind, i.provider_id, i.email, \
                                i.phone_no, i.password_hash, i.access_token, i.refresh_token, \
                                i.token_expires_at, i.created_at, i.updated_at";

/// Unique constraints guarding one identity per (principal, provider) and
/// per (provider, email).
const IDENTITY_CONSTRAINTS: [&str; 2] = [
    "auth_identities_principal_provider_key",
    "auth_identities_provider_email_key",
];

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &PgRow) -> Result<User, AuthError> {
        let email: String = row.try_get("email").map_err(storage_error)?;
        Ok(User {
            id: PrincipalId(row.try_get("id").map_err(storage_error)?),
            email: EmailAddress::new(&email).map_err(corrupt_row)?,
            name: row.try_get("name").map_err(storage_error)?,
            phone_no: row.try_get("phone_no").map_err(storage_error)?,
            profile_pic: row.try_get("profile_pic").map_err(storage_error)?,
            is_active: row.try_get("is_active").map_err(storage_error)?,
            is_creator: row.try_get("is_creator").map_err(storage_error)?,
            created_at: row.try_get("created_at").map_err(storage_error)?,
            updated_at: row.try_get("updated_at").map_err(storage_error)?,
        })
    }

    fn row_to_admin(row: &PgRow) -> Result<Admin, AuthError> {
        let email: String = row.try_get("email").map_err(storage_error)?;
        Ok(Admin {
            id: PrincipalId(row.try_get("id").map_err(storage_error)?),
            email: EmailAddress::new(&email).map_err(corrupt_row)?,
            name: row.try_get("name").map_err(storage_error)?,
            password_hash: row.try_get("password_hash").map_err(storage_error)?,
            is_active: row.try_get("is_active").map_err(storage_error)?,
            created_at: row.try_get("created_at").map_err(storage_error)?,
            updated_at: row.try_get("updated_at").map_err(storage_error)?,
        })
    }

    fn row_to_identity(row: &PgRow) -> Result<Identity, AuthError> {
        let principal_kind: String = row.try_get("principal_kind").map_err(storage_error)?;
        Ok(Identity {
            id: IdentityId(row.try_get("id").map_err(storage_error)?),
            principal_id: PrincipalId(row.try_get("principal_id").map_err(storage_error)?),
            principal_kind: principal_kind.parse::<PrincipalKind>().map_err(corrupt_row)?,
            provider_id: ProviderId(row.try_get("provider_id").map_err(storage_error)?),
            email: row.try_get("email").map_err(storage_error)?,
            phone_no: row.try_get("phone_no").map_err(storage_error)?,
            password_hash: row.try_get("password_hash").map_err(storage_error)?,
            access_token: row.try_get("access_token").map_err(storage_error)?,
            refresh_token: row.try_get("refresh_token").map_err(storage_error)?,
            token_expires_at: row.try_get("token_expires_at").map_err(storage_error)?,
            created_at: row.try_get("created_at").map_err(storage_error)?,
            updated_at: row.try_get("updated_at").map_err(storage_error)?,
        })
    }

    fn row_to_provider(row: &PgRow) -> Result<AuthProvider, AuthError> {
        Ok(AuthProvider {
            id: ProviderId(row.try_get("id").map_err(storage_error)?),
            name: row.try_get("provider_name").map_err(storage_error)?,
            provider_type: row.try_get("provider_type").map_err(storage_error)?,
            config: row.try_get("config").map_err(storage_error)?,
        })
    }

    async fn fetch_identity(
        &self,
        condition: &str,
        principal_id: &PrincipalId,
        second: IdentityFilter<'_>,
    ) -> Result<Option<Identity>, AuthError> {
        let sql = format!(
            "SELECT {} FROM auth_identities i WHERE i.principal_id = $1 AND {}",
            IDENTITY_COLUMNS, condition
        );
        let query = sqlx::query(&sql).bind(principal_id.0);
        let query = match second {
            IdentityFilter::Provider(provider_id) => query.bind(provider_id.0),
            IdentityFilter::RefreshToken(token) => query.bind(token),
        };

        query
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .as_ref()
            .map(Self::row_to_identity)
            .transpose()
    }

    async fn update_user_flag(
        &self,
        column: &str,
        id: &PrincipalId,
        value: bool,
    ) -> Result<Option<User>, AuthError> {
        let sql = format!(
            "UPDATE users SET {} = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            column, USER_COLUMNS
        );

        sqlx::query(&sql)
            .bind(id.0)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .as_ref()
            .map(Self::row_to_user)
            .transpose()
    }
}

enum IdentityFilter<'a> {
    Provider(ProviderId),
    RefreshToken(&'a str),
}

/// Classify a driver error. Connectivity problems are transient and surface
/// as `StorageUnavailable`; everything else is a `StorageError`.
fn storage_error(err: sqlx::Error) -> AuthError {
    let unavailable = match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => true,
        // 08: connection exception, 57P: operator intervention (shutdown)
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| code.starts_with("08") || code.starts_with("57P")),
        _ => false,
    };

    if unavailable {
        tracing::error!(error = %err, "Database unavailable");
        AuthError::StorageUnavailable(err.to_string())
    } else {
        tracing::error!(error = %err, "Database operation failed");
        AuthError::StorageError(err.to_string())
    }
}

fn duplicate_or_storage_error(err: sqlx::Error, constraints: &[&str]) -> AuthError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation()
            && db_err
                .constraint()
                .is_some_and(|constraint| constraints.iter().any(|name| *name == constraint))
        {
            return AuthError::DuplicateIdentity;
        }
    }
    storage_error(err)
}

fn corrupt_row(err: impl std::fmt::Display) -> AuthError {
    tracing::error!(error = %err, "Stored row failed validation");
    AuthError::StorageError(err.to_string())
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn ensure_provider(
        &self,
        name: &str,
        provider_type: &str,
    ) -> Result<AuthProvider, AuthError> {
        let row = sqlx::query(
            r#"
            INSERT INTO auth_providers (provider_name, provider_type)
            VALUES ($1, $2)
            ON CONFLICT (provider_name) DO UPDATE SET provider_name = EXCLUDED.provider_name
            RETURNING id, provider_name, provider_type, config
            "#,
        )
        .bind(name)
        .bind(provider_type)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Self::row_to_provider(&row)
    }

    async fn find_identity_by_email(
        &self,
        provider_name: &str,
        email: &EmailAddress,
    ) -> Result<Option<Identity>, AuthError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM auth_identities i
            JOIN auth_providers p ON p.id = i.provider_id
            WHERE p.provider_name = $1 AND i.email = $2
            "#,
            IDENTITY_COLUMNS
        );

        sqlx::query(&sql)
            .bind(provider_name)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .as_ref()
            .map(Self::row_to_identity)
            .transpose()
    }

    async fn find_identity(
        &self,
        principal_id: &PrincipalId,
        provider_id: ProviderId,
    ) -> Result<Option<Identity>, AuthError> {
        self.fetch_identity(
            "i.provider_id = $2",
            principal_id,
            IdentityFilter::Provider(provider_id),
        )
        .await
    }

    async fn find_identity_by_refresh_token(
        &self,
        principal_id: &PrincipalId,
        refresh_token: &str,
    ) -> Result<Option<Identity>, AuthError> {
        self.fetch_identity(
            "i.refresh_token = $2",
            principal_id,
            IdentityFilter::RefreshToken(refresh_token),
        )
        .await
    }

    async fn find_user(&self, id: &PrincipalId) -> Result<Option<User>, AuthError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .as_ref()
            .map(Self::row_to_user)
            .transpose()
    }

    async fn find_admin(&self, id: &PrincipalId) -> Result<Option<Admin>, AuthError> {
        let sql = format!("SELECT {} FROM admins WHERE id = $1", ADMIN_COLUMNS);

        sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .as_ref()
            .map(Self::row_to_admin)
            .transpose()
    }

    async fn find_admin_by_email(&self, email: &EmailAddress) -> Result<Option<Admin>, AuthError> {
        let sql = format!("SELECT {} FROM admins WHERE email = $1", ADMIN_COLUMNS);

        sqlx::query(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .as_ref()
            .map(Self::row_to_admin)
            .transpose()
    }

    async fn create_admin(&self, admin: &Admin) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO admins (id, name, email, password_hash, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(admin.id.0)
        .bind(admin.name.as_deref())
        .bind(admin.email.as_str())
        .bind(&admin.password_hash)
        .bind(admin.is_active)
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_or_storage_error(e, &["admins_email_key"]))?;

        Ok(())
    }

    async fn create_user_with_identity(
        &self,
        user: &User,
        identity: &Identity,
    ) -> Result<(), AuthError> {
        // Dropped without commit on any early return: rolled back
        let mut transaction = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, phone_no, profile_pic, is_active, is_creator,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(user.name.as_deref())
        .bind(user.phone_no.as_deref())
        .bind(user.profile_pic.as_deref())
        .bind(user.is_active)
        .bind(user.is_creator)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *transaction)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            INSERT INTO auth_identities (id, principal_id, principal_kind, provider_id, email,
                                         phone_no, password_hash, access_token, refresh_token,
                                         token_expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.principal_id.0)
        .bind(identity.principal_kind.as_str())
        .bind(identity.provider_id.0)
        .bind(identity.email.as_deref())
        .bind(identity.phone_no.as_deref())
        .bind(identity.password_hash.as_deref())
        .bind(identity.access_token.as_deref())
        .bind(identity.refresh_token.as_deref())
        .bind(identity.token_expires_at)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(&mut *transaction)
        .await
        .map_err(|e| duplicate_or_storage_error(e, &IDENTITY_CONSTRAINTS))?;

        transaction.commit().await.map_err(storage_error)?;

        Ok(())
    }

    async fn upsert_identity(&self, identity: &Identity) -> Result<Identity, AuthError> {
        let sql = format!(
            r#"
            INSERT INTO auth_identities AS i (id, principal_id, principal_kind, provider_id, email,
                                              phone_no, password_hash, access_token, refresh_token,
                                              token_expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (principal_id, provider_id) DO UPDATE SET
                email = EXCLUDED.email,
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                token_expires_at = EXCLUDED.token_expires_at,
                updated_at = NOW()
            RETURNING {}
            "#,
            IDENTITY_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(identity.id.0)
            .bind(identity.principal_id.0)
            .bind(identity.principal_kind.as_str())
            .bind(identity.provider_id.0)
            .bind(identity.email.as_deref())
            .bind(identity.phone_no.as_deref())
            .bind(identity.password_hash.as_deref())
            .bind(identity.access_token.as_deref())
            .bind(identity.refresh_token.as_deref())
            .bind(identity.token_expires_at)
            .bind(identity.created_at)
            .bind(identity.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| duplicate_or_storage_error(e, &IDENTITY_CONSTRAINTS))?;

        Self::row_to_identity(&row)
    }

    async fn store_tokens(&self, id: &IdentityId, tokens: &IssuedTokens) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            UPDATE auth_identities
            SET access_token = $2, refresh_token = $3, token_expires_at = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(tokens.access_expires_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn store_access_token(
        &self,
        id: &IdentityId,
        access: &IssuedAccess,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            UPDATE auth_identities
            SET access_token = $2, token_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(&access.access_token)
        .bind(access.expires_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn clear_tokens(
        &self,
        principal_id: &PrincipalId,
        provider_id: ProviderId,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            UPDATE auth_identities
            SET access_token = NULL, refresh_token = NULL, token_expires_at = NULL,
                updated_at = NOW()
            WHERE principal_id = $1 AND provider_id = $2
            "#,
        )
        .bind(principal_id.0)
        .bind(provider_id.0)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn update_password_hash(
        &self,
        id: &IdentityId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            UPDATE auth_identities
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn set_user_active(
        &self,
        id: &PrincipalId,
        is_active: bool,
    ) -> Result<Option<User>, AuthError> {
        self.update_user_flag("is_active", id, is_active).await
    }

    async fn set_user_creator(
        &self,
        id: &PrincipalId,
        is_creator: bool,
    ) -> Result<Option<User>, AuthError> {
        self.update_user_flag("is_creator", id, is_creator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_errors_are_unavailable() {
        assert!(matches!(
            storage_error(sqlx::Error::PoolTimedOut),
            AuthError::StorageUnavailable(_)
        ));
        assert!(matches!(
            storage_error(sqlx::Error::PoolClosed),
            AuthError::StorageUnavailable(_)
        ));
        assert!(matches!(
            storage_error(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused"
            ))),
            AuthError::StorageUnavailable(_)
        ));
        assert!(matches!(
            storage_error(sqlx::Error::Protocol("unexpected message".to_string())),
            AuthError::StorageUnavailable(_)
        ));
    }

    #[test]
    fn test_other_errors_are_storage_errors() {
        assert!(matches!(
            storage_error(sqlx::Error::RowNotFound),
            AuthError::StorageError(_)
        ));
        assert!(matches!(
            storage_error(sqlx::Error::ColumnNotFound("email".to_string())),
            AuthError::StorageError(_)
        ));
        assert!(matches!(
            duplicate_or_storage_error(sqlx::Error::RowNotFound, &IDENTITY_CONSTRAINTS),
            AuthError::StorageError(_)
        ));
    }
}
