//! Password hashing and login tokens.
//!
//! Passwords are stored as Argon2 PHC strings. Logins return an HS256 JWT
//! carrying the account id and role; the service keeps no session state.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::model::Role;

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id (`CON001`, `MAT001`, ...).
    pub sub: String,
    /// Account role.
    pub role: Role,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
}

/// Hash a password with a fresh salt.
///
/// # Errors
///
/// Returns [`Error::PasswordHash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// Check a password against a stored hash.
///
/// # Errors
///
/// Returns [`Error::PasswordHash`] if the stored hash is not a valid PHC
/// string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Issue a signed token for an account.
///
/// # Errors
///
/// Returns [`Error::Token`] if signing fails.
pub fn issue_token(subject: &str, role: Role, config: &AuthConfig) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: subject.to_string(),
        role,
        exp: (now + Duration::hours(i64::from(config.token_ttl_hours))).timestamp(),
        iat: now.timestamp(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?)
}

/// Verify a token's signature and expiry.
///
/// # Errors
///
/// Returns [`Error::Unauthorized`] for a bad signature, an expired token or
/// a malformed token.
pub fn validate_token(token: &str, config: &AuthConfig) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| Error::unauthorized("Invalid or expired token"))
}
