use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::principal::errors::EmailError;
use crate::principal::errors::PasswordPolicyError;
use crate::principal::errors::PrincipalIdError;
use crate::principal::errors::PrincipalKindError;
use crate::principal::errors::ProfileFieldError;

/// Principal unique identifier type, shared by users and admins.
///
/// Users and admins live in separate tables but never share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    /// Generate a new random principal ID.
    ///
    /// # Returns
    /// PrincipalId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a principal ID from string.
    ///
    /// # Arguments
    /// * `s` - UUID string to parse
    ///
    /// # Returns
    /// Parsed PrincipalId
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, PrincipalIdError> {
        Uuid::parse_str(s)
            .map(PrincipalId)
            .map_err(|e| PrincipalIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which table a principal lives in. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrincipalKind {
    User,
    Admin,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, PrincipalKind::Admin)
    }
}

impl FromStr for PrincipalKind {
    type Err = PrincipalKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(PrincipalKind::User),
            "admin" => Ok(PrincipalKind::Admin),
            other => Err(PrincipalKindError(other.to_string())),
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical role of an authenticated principal.
///
/// Derived from the principal kind and the creator flag; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Creator,
    User,
}

impl Role {
    /// Derive the role of a principal.
    ///
    /// Admins are always `Admin`, whatever else is set.
    pub fn derive(kind: PrincipalKind, is_creator: bool) -> Self {
        match (kind, is_creator) {
            (PrincipalKind::Admin, _) => Role::Admin,
            (PrincipalKind::User, true) => Role::Creator,
            (PrincipalKind::User, false) => Role::User,
        }
    }

    /// Scope string as carried by the historical scope-based checks.
    pub fn as_scope(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Creator => "Creator",
            Role::User => "User",
        }
    }

    /// Parse a scope string. Exact, case-sensitive match.
    pub fn from_scope(scope: &str) -> Option<Self> {
        match scope {
            "Admin" => Some(Role::Admin),
            "Creator" => Some(Role::Creator),
            "User" => Some(Role::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_scope())
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser. Stored trimmed and
/// lowercased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Returns
    /// Validated EmailAddress value object
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: &str) -> Result<Self, EmailError> {
        let normalized = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&normalized)
            .map(|_| EmailAddress(normalized))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plain-text password that satisfies the length policy.
///
/// Never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainPassword(String);

impl PlainPassword {
    const MIN_LENGTH: usize = 6;
    const MAX_LENGTH: usize = 100;

    /// # Errors
    /// * `TooShort` - Fewer than 6 characters
    /// * `TooLong` - More than 100 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(PasswordPolicyError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(password))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(**redacted**)")
    }
}

/// Display name, at most 200 characters. Blank input is treated as absent.
pub fn parse_name(name: Option<String>) -> Result<Option<String>, ProfileFieldError> {
    bounded_field("name", name, 200)
}

/// Phone number, at most 32 characters. Blank input is treated as absent.
pub fn parse_phone_no(phone_no: Option<String>) -> Result<Option<String>, ProfileFieldError> {
    bounded_field("phone_no", phone_no, 32)
}

fn bounded_field(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, ProfileFieldError> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let actual = value.chars().count();
    if actual > max {
        return Err(ProfileFieldError::TooLong { field, max, actual });
    }
    Ok(Some(value))
}

/// User aggregate entity.
///
/// A regular account of the recipe app. Credentials are held by its
/// identities, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: PrincipalId,
    pub email: EmailAddress,
    pub name: Option<String>,
    pub phone_no: Option<String>,
    pub profile_pic: Option<String>,
    pub is_active: bool,
    pub is_creator: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A new, active, non-creator user.
    pub fn new(email: EmailAddress, name: Option<String>, phone_no: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PrincipalId::new(),
            email,
            name,
            phone_no,
            profile_pic: None,
            is_active: true,
            is_creator: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn role(&self) -> Role {
        Role::derive(PrincipalKind::User, self.is_creator)
    }
}

/// Admin aggregate entity.
///
/// Unlike users, admins carry their own password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub id: PrincipalId,
    pub email: EmailAddress,
    pub name: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(email: EmailAddress, name: Option<String>, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: PrincipalId::new(),
            email,
            name,
            password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
