use auth::PasswordError;
use auth::TokenError;
use thiserror::Error;

use crate::principal::errors::EmailError;
use crate::principal::errors::PasswordPolicyError;
use crate::principal::errors::PrincipalIdError;
use crate::principal::errors::ProfileFieldError;

/// Top-level error for every authentication, session and moderation operation.
///
/// Display strings are for logs. Response bodies are chosen by the HTTP
/// adapter and never carry storage details.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    // Request authentication
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token malformed or forged: {0}")]
    MalformedOrForged(String),

    #[error("No identity backs this token: {0}")]
    IdentityNotFound(String),

    #[error("Principal inactive or gone: {0}")]
    PrincipalInactive(String),

    // Session operations
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDisabled,

    #[error("Email already registered")]
    DuplicateIdentity,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    // Authorization
    #[error("Unauthorized Access")]
    Forbidden,

    #[error("Principal not found: {0}")]
    PrincipalNotFound(String),

    #[error("{0}")]
    Validation(String),

    // Infrastructure errors
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether this error only means "the bearer is not who they claim to be".
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::ExpiredToken
                | AuthError::MalformedOrForged(_)
                | AuthError::IdentityNotFound(_)
                | AuthError::PrincipalInactive(_)
        )
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::MalformedOrForged(reason) => AuthError::MalformedOrForged(reason),
            TokenError::MissingSecret | TokenError::EncodingFailed(_) => {
                AuthError::Internal(err.to_string())
            }
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<EmailError> for AuthError {
    fn from(err: EmailError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<ProfileFieldError> for AuthError {
    fn from(err: ProfileFieldError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<PrincipalIdError> for AuthError {
    fn from(err: PrincipalIdError) -> Self {
        AuthError::Validation(err.to_string())
    }
}
