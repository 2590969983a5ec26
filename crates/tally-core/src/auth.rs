//! Authentication primitives: password hashing and bearer tokens
//!
//! Passwords are stored as Argon2id hashes. API access uses short-lived
//! HS256 access tokens plus a longer-lived refresh token; the two are
//! distinguished by a `kind` claim so one can never stand in for the other.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Access token lifetime
pub fn access_token_ttl() -> Duration {
    Duration::hours(1)
}

/// Refresh token lifetime
pub fn refresh_token_ttl() -> Duration {
    Duration::days(7)
}

/// Which of the two token flavors a JWT is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id
    sub: i64,
    /// Expiry as unix seconds
    exp: i64,
    kind: TokenKind,
}

/// Hash a password with Argon2id and a fresh salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Issue a token of the given kind for a user
pub fn sign_token(user_id: i64, kind: TokenKind, secret: &str) -> Result<String> {
    let ttl = match kind {
        TokenKind::Access => access_token_ttl(),
        TokenKind::Refresh => refresh_token_ttl(),
    };
    let claims = Claims {
        sub: user_id,
        exp: (Utc::now() + ttl).timestamp(),
        kind,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Verify a token and return the user id it was issued for
///
/// Rejects expired tokens, bad signatures, and tokens of the wrong kind;
/// all failures collapse into `Error::Auth` so callers surface a uniform 401.
pub fn verify_token(token: &str, expected: TokenKind, secret: &str) -> Result<i64> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| Error::Auth(format!("Invalid token: {}", e)))?;

    if data.claims.kind != expected {
        return Err(Error::Auth("Wrong token kind".to_string()));
    }

    Ok(data.claims.sub)
}
