use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::errors::TokenError;

/// Purpose of a token, carried in the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    /// Any other `type` value. Decoding succeeds; callers reject it.
    #[serde(other)]
    Unknown,
}

/// Claim set carried by access and refresh tokens.
///
/// Wire names are fixed: `sub`, `email`, `iat`, `exp`, `provider_id`,
/// `is_admin`, `type`. Refresh tokens omit `provider_id` and `is_admin`:
/// they re-establish identity but never authorization. Issued tokens also
/// carry a random `jti` so that two tokens minted in the same second differ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Principal identifier
    pub sub: String,

    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,

    #[serde(rename = "type")]
    pub kind: TokenKind,

    /// Token identifier; optional when decoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// Build access-token claims valid for `ttl` from `issued_at`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Expiry is not representable
    pub fn access(
        principal_id: impl ToString,
        email: impl Into<String>,
        provider_id: i32,
        is_admin: bool,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, TokenError> {
        Ok(Self {
            sub: principal_id.to_string(),
            email: email.into(),
            iat: issued_at.timestamp(),
            exp: expiry(issued_at, ttl)?,
            provider_id: Some(provider_id),
            is_admin: Some(is_admin),
            kind: TokenKind::Access,
            jti: Some(Uuid::new_v4().to_string()),
        })
    }

    /// Build refresh-token claims valid for `ttl` from `issued_at`.
    pub fn refresh(
        principal_id: impl ToString,
        email: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, TokenError> {
        Ok(Self {
            sub: principal_id.to_string(),
            email: email.into(),
            iat: issued_at.timestamp(),
            exp: expiry(issued_at, ttl)?,
            provider_id: None,
            is_admin: None,
            kind: TokenKind::Refresh,
            jti: Some(Uuid::new_v4().to_string()),
        })
    }

    /// Admin flag; absent means not an admin.
    pub fn is_admin(&self) -> bool {
        self.is_admin.unwrap_or(false)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

fn expiry(issued_at: DateTime<Utc>, ttl: Duration) -> Result<i64, TokenError> {
    issued_at
        .checked_add_signed(ttl)
        .map(|expires_at| expires_at.timestamp())
        .ok_or_else(|| TokenError::EncodingFailed(format!("token lifetime out of range: {}", ttl)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_claims() {
        let now = Utc::now();
        let claims = Claims::access("user123", "alice@example.com", 4, false, now, Duration::minutes(30)).unwrap();

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.provider_id, Some(4));
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(!claims.is_admin());
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_refresh_claims_carry_no_role() {
        let claims = Claims::refresh("user123", "alice@example.com", Utc::now(), Duration::days(7)).unwrap();

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "refresh");
        assert!(json.get("provider_id").is_none());
        assert!(json.get("is_admin").is_none());
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_wire_claim_names() {
        let claims = Claims::access("abc", "a@b.io", 1, true, Utc::now(), Duration::hours(8)).unwrap();
        let json = serde_json::to_value(&claims).unwrap();

        for key in ["sub", "email", "iat", "exp", "provider_id", "is_admin", "type"] {
            assert!(json.get(key).is_some(), "missing claim {key}");
        }
        assert_eq!(json["is_admin"], true);
    }

    #[test]
    fn test_unknown_kind_deserializes() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "abc",
            "email": "a@b.io",
            "iat": 1,
            "exp": 2,
            "type": "password-reset"
        }))
        .unwrap();

        assert_eq!(claims.kind, TokenKind::Unknown);
        assert_eq!(claims.provider_id, None);
        assert_eq!(claims.jti, None);
    }

    #[test]
    fn test_same_second_claims_differ() {
        let now = Utc::now();
        let first = Claims::access("abc", "a@b.io", 1, false, now, Duration::minutes(30)).unwrap();
        let second = Claims::access("abc", "a@b.io", 1, false, now, Duration::minutes(30)).unwrap();

        assert_ne!(first, second);
        assert_eq!(first.iat, second.iat);
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let ttl = Duration::days(1_000_000_000);

        assert!(matches!(
            Claims::access("abc", "a@b.io", 1, false, Utc::now(), ttl),
            Err(TokenError::EncodingFailed(_))
        ));
        assert!(matches!(
            Claims::refresh("abc", "a@b.io", Utc::now(), ttl),
            Err(TokenError::EncodingFailed(_))
        ));
    }
}
