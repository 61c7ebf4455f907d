use std::fmt;

use auth::IssuedTokens;
use chrono::DateTime;
use chrono::Utc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::identity::errors::AuthError;
use crate::principal::errors::PasswordPolicyError;
use crate::principal::models::parse_name;
use crate::principal::models::parse_phone_no;
use crate::principal::models::Admin;
use crate::principal::models::EmailAddress;
use crate::principal::models::PlainPassword;
use crate::principal::models::PrincipalId;
use crate::principal::models::PrincipalKind;
use crate::principal::models::Role;
use crate::principal::models::User;

/// Provider holding email + password credentials of users.
pub const EMAIL_PROVIDER: &str = "email";

/// Provider backing admin sessions. Admin passwords live on the admin row.
pub const ADMIN_PROVIDER: &str = "admin";

/// Type tag of password-based providers.
pub const CREDENTIALS_PROVIDER_TYPE: &str = "credentials";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(pub i32);

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Named credential source.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthProvider {
    pub id: ProviderId,
    pub name: String,
    pub provider_type: Option<String>,
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Binding of one principal to one provider.
///
/// The stored token pair is the server-side record of the current session:
/// a token that decodes but does not match it is not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
    pub principal_id: PrincipalId,
    pub principal_kind: PrincipalKind,
    pub provider_id: ProviderId,
    pub email: Option<String>,
    pub phone_no: Option<String>,
    pub password_hash: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// A new identity holding a freshly issued token pair.
    pub fn with_tokens(
        principal_id: PrincipalId,
        principal_kind: PrincipalKind,
        provider_id: ProviderId,
        email: &EmailAddress,
        password_hash: Option<String>,
        tokens: &IssuedTokens,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: IdentityId::new(),
            principal_id,
            principal_kind,
            provider_id,
            email: Some(email.as_str().to_string()),
            phone_no: None,
            password_hash,
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
            token_expires_at: Some(tokens.access_expires_at),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `presented` is the current, unexpired access token of this
    /// identity. Comparison is constant-time.
    pub fn accepts_access_token(&self, presented: &str, now: DateTime<Utc>) -> bool {
        let (Some(stored), Some(expires_at)) = (&self.access_token, self.token_expires_at) else {
            return false;
        };
        expires_at > now && tokens_match(stored, presented)
    }

    /// Whether `presented` is the stored refresh token. Comparison is
    /// constant-time.
    pub fn holds_refresh_token(&self, presented: &str) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|stored| tokens_match(stored, presented))
    }
}

fn tokens_match(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Command to register a new user under the email provider.
#[derive(Debug)]
pub struct SignUpCommand {
    pub email: EmailAddress,
    pub password: PlainPassword,
    pub name: Option<String>,
    pub phone_no: Option<String>,
}

impl SignUpCommand {
    /// Validate raw sign-up input.
    ///
    /// # Errors
    /// * `Validation` - Bad email syntax, password outside 6-100 characters,
    ///   name over 200 or phone over 32 characters
    pub fn new(
        email: &str,
        password: String,
        name: Option<String>,
        phone_no: Option<String>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            email: EmailAddress::new(email)?,
            password: PlainPassword::new(password)?,
            name: parse_name(name)?,
            phone_no: parse_phone_no(phone_no)?,
        })
    }
}

/// Command to open a session with email + password.
///
/// The password is not checked against the policy: it is only ever compared
/// with a stored hash.
#[derive(Debug)]
pub struct SignInCommand {
    pub email: EmailAddress,
    pub password: String,
}

impl SignInCommand {
    /// # Errors
    /// * `Validation` - Bad email syntax
    pub fn new(email: &str, password: String) -> Result<Self, AuthError> {
        Ok(Self {
            email: EmailAddress::new(email)?,
            password,
        })
    }
}

/// Command to replace the password of the caller's identity.
#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub old_password: String,
    pub new_password: PlainPassword,
}

impl ChangePasswordCommand {
    /// # Errors
    /// * `Validation` - New password outside 6-100 characters or equal to the old one
    pub fn new(old_password: String, new_password: String) -> Result<Self, AuthError> {
        let new_password = PlainPassword::new(new_password)?;
        if new_password.as_str() == old_password {
            return Err(PasswordPolicyError::Unchanged.into());
        }
        Ok(Self {
            old_password,
            new_password,
        })
    }
}

/// The principal behind a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalProfile {
    User(User),
    Admin(Admin),
}

impl PrincipalProfile {
    pub fn id(&self) -> PrincipalId {
        match self {
            PrincipalProfile::User(user) => user.id,
            PrincipalProfile::Admin(admin) => admin.id,
        }
    }

    pub fn email(&self) -> &EmailAddress {
        match self {
            PrincipalProfile::User(user) => &user.email,
            PrincipalProfile::Admin(admin) => &admin.email,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            PrincipalProfile::User(user) => user.role(),
            PrincipalProfile::Admin(_) => Role::Admin,
        }
    }
}

/// Result of a successful sign-up or sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub principal: PrincipalProfile,
    pub provider_id: ProviderId,
    pub tokens: IssuedTokens,
}
