use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::Claims;
use crate::jwt::TokenCodec;
use crate::jwt::TokenError;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Default lifetimes of issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub user_access: Duration,
    pub admin_access: Duration,
    pub refresh: Duration,
}

impl TokenLifetimes {
    /// Access-token lifetime for the given principal kind.
    pub fn access_for(&self, is_admin: bool) -> Duration {
        if is_admin {
            self.admin_access
        } else {
            self.user_access
        }
    }
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            user_access: Duration::minutes(30),
            admin_access: Duration::hours(8),
            refresh: Duration::days(7),
        }
    }
}

/// Freshly minted access + refresh pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of the access token, as encoded in its `exp` claim
    pub access_expires_at: DateTime<Utc>,
}

/// Freshly minted access token on its own (refresh flow).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedAccess {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Credential coordinator combining password hashing and token issuance.
///
/// Built once at startup from the signing secret and the configured
/// lifetimes, then shared by every request.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_codec: TokenCodec,
    lifetimes: TokenLifetimes,
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for token signing
    /// * `lifetimes` - Default token lifetimes
    ///
    /// # Errors
    /// * `MissingSecret` - The secret is empty
    pub fn new(jwt_secret: &[u8], lifetimes: TokenLifetimes) -> Result<Self, TokenError> {
        Ok(Self {
            password_hasher: PasswordHasher::new(),
            token_codec: TokenCodec::new(jwt_secret)?,
            lifetimes,
        })
    }

    /// Replace the password hasher (e.g. to tune cost parameters).
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.token_codec
    }

    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Mint an access + refresh pair for a principal.
    ///
    /// The access token uses the admin or user lifetime depending on
    /// `is_admin`; the refresh token always uses the refresh lifetime.
    pub fn issue_tokens(
        &self,
        principal_id: impl ToString,
        email: &str,
        provider_id: i32,
        is_admin: bool,
    ) -> Result<IssuedTokens, TokenError> {
        let principal_id = principal_id.to_string();
        let access = self.issue_access(&principal_id, email, provider_id, is_admin)?;
        let refresh_token =
            self.token_codec
                .issue_refresh(&principal_id, email, self.lifetimes.refresh)?;

        Ok(IssuedTokens {
            access_token: access.access_token,
            refresh_token,
            access_expires_at: access.expires_at,
        })
    }

    /// Mint an access token only.
    pub fn issue_access(
        &self,
        principal_id: impl ToString,
        email: &str,
        provider_id: i32,
        is_admin: bool,
    ) -> Result<IssuedAccess, TokenError> {
        let claims = Claims::access(
            principal_id,
            email,
            provider_id,
            is_admin,
            Utc::now(),
            self.lifetimes.access_for(is_admin),
        )?;
        let expires_at = claims.expires_at().ok_or_else(|| {
            TokenError::EncodingFailed(format!("expiry out of range: {}", claims.exp))
        })?;

        Ok(IssuedAccess {
            access_token: self.token_codec.encode(&claims)?,
            expires_at,
        })
    }

    /// Verify and decode a token.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.token_codec.decode(token)
    }
}
