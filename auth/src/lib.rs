//! Authentication utilities library
//!
//! Provides the credential primitives used by the identity service:
//! - Password hashing (Argon2id)
//! - Access/refresh token issuance and validation (HS256 JWT)
//! - An `Authenticator` bundling both with configured token lifetimes
//!
//! Deciding whether a decoded token is acceptable (kind, backing identity,
//! principal state) is left to the service.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{Authenticator, TokenKind, TokenLifetimes};
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!", TokenLifetimes::default())
//!     .unwrap();
//!
//! let tokens = auth.issue_tokens("user123", "alice@example.com", 1, false).unwrap();
//! let claims = auth.decode(&tokens.access_token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! assert_eq!(claims.kind, TokenKind::Access);
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::Authenticator;
pub use authenticator::IssuedAccess;
pub use authenticator::IssuedTokens;
pub use authenticator::TokenLifetimes;
pub use jwt::Claims;
pub use jwt::TokenCodec;
pub use jwt::TokenError;
pub use jwt::TokenKind;
pub use password::PasswordError;
pub use password::PasswordHasher;
