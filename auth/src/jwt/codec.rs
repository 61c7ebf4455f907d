use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;

/// Signs and parses access/refresh tokens with one process-wide secret.
///
/// Uses HS256. Expiry is checked with zero leeway: a token is rejected as soon
/// as the current time passes its `exp`.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenCodec {
    /// Create a codec from the signing secret.
    ///
    /// # Errors
    /// * `MissingSecret` - The secret is empty
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        })
    }

    /// Issue an access token expiring `ttl` from now.
    pub fn issue_access(
        &self,
        principal_id: impl ToString,
        email: &str,
        provider_id: i32,
        is_admin: bool,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.encode(&Claims::access(
            principal_id,
            email,
            provider_id,
            is_admin,
            Utc::now(),
            ttl,
        )?)
    }

    /// Issue a refresh token expiring `ttl` from now.
    pub fn issue_refresh(
        &self,
        principal_id: impl ToString,
        email: &str,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.encode(&Claims::refresh(principal_id, email, Utc::now(), ttl)?)
    }

    /// Sign a prepared claim set.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify the signature and expiry of a token and return its claims.
    ///
    /// Only structural validity is checked here. Whether the claims are
    /// acceptable for a given use (token kind, backing identity) is up to the
    /// caller.
    ///
    /// # Errors
    /// * `Expired` - Current time is past `exp`
    /// * `MalformedOrForged` - Bad signature, bad structure or missing claims
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::MalformedOrForged(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;
    use crate::jwt::claims::TokenKind;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    #[test]
    fn test_issue_and_decode_access() {
        let codec = TokenCodec::new(SECRET).unwrap();

        let token = codec
            .issue_access("user123", "alice@example.com", 1, false, Duration::minutes(30))
            .expect("Failed to issue token");

        let claims = codec.decode(&token).expect("Failed to decode token");
        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.provider_id, Some(1));
        assert_eq!(claims.is_admin, Some(false));
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_decode_returns_encoded_claims() {
        let codec = TokenCodec::new(SECRET).unwrap();
        let claims = Claims::access("admin1", "root@example.com", 2, true, Utc::now(), Duration::hours(8)).unwrap();

        let token = codec.encode(&claims).unwrap();
        assert_eq!(codec.decode(&token).unwrap(), claims);
    }

    #[test]
    fn test_issue_refresh() {
        let codec = TokenCodec::new(SECRET).unwrap();

        let token = codec
            .issue_refresh("user123", "alice@example.com", Duration::days(7))
            .unwrap();

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.provider_id, None);
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_expired_token() {
        let codec = TokenCodec::new(SECRET).unwrap();

        let token = codec
            .issue_access("user123", "alice@example.com", 1, false, Duration::seconds(-5))
            .unwrap();

        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let codec1 = TokenCodec::new(b"secret1_at_least_32_bytes_long_key!").unwrap();
        let codec2 = TokenCodec::new(b"secret2_at_least_32_bytes_long_key!").unwrap();

        let token = codec1
            .issue_access("user123", "alice@example.com", 1, false, Duration::minutes(5))
            .unwrap();

        assert!(matches!(
            codec2.decode(&token),
            Err(TokenError::MalformedOrForged(_))
        ));
    }

    #[test]
    fn test_decode_tampered_payload() {
        let codec = TokenCodec::new(SECRET).unwrap();
        let token = codec
            .issue_access("user123", "alice@example.com", 1, false, Duration::minutes(5))
            .unwrap();
        let admin_token = codec
            .issue_access("user123", "alice@example.com", 1, true, Duration::minutes(5))
            .unwrap();

        // Splice the admin payload onto the user signature
        let parts: Vec<&str> = token.split('.').collect();
        let admin_parts: Vec<&str> = admin_token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], admin_parts[1], parts[2]);

        assert!(matches!(
            codec.decode(&forged),
            Err(TokenError::MalformedOrForged(_))
        ));
    }

    #[test]
    fn test_decode_garbage() {
        let codec = TokenCodec::new(SECRET).unwrap();
        assert!(matches!(
            codec.decode("invalid.token.here"),
            Err(TokenError::MalformedOrForged(_))
        ));
    }

    #[test]
    fn test_decode_missing_required_claim() {
        #[derive(Serialize)]
        struct NoEmail {
            sub: String,
            iat: i64,
            exp: i64,
            #[serde(rename = "type")]
            kind: String,
        }

        let codec = TokenCodec::new(SECRET).unwrap();
        let now = Utc::now().timestamp();
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &NoEmail {
                sub: "user123".to_string(),
                iat: now,
                exp: now + 60,
                kind: "access".to_string(),
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            codec.decode(&token),
            Err(TokenError::MalformedOrForged(_))
        ));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(TokenCodec::new(b""), Err(TokenError::MissingSecret)));
    }
}
