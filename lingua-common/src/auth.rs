//! Credential and access-token primitives
//!
//! Passwords are stored as bcrypt hashes. API access uses bearer tokens:
//! HS256-signed JWTs carrying the user id as subject, expiring after a
//! configurable lifetime (24h by default).
//!
//! This module contains only pure functions. HTTP extraction and the
//! 401 mapping live in the service crate.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued to
    pub sub: String,
    /// Expiry (Unix seconds)
    pub exp: i64,
    /// Issued-at (Unix seconds)
    pub iat: i64,
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against its stored hash
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))
}

/// Issue a signed access token for a user
pub fn issue_token(user_id: &str, secret: &str, lifetime_hours: i64) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::hours(lifetime_hours)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Token encoding failed: {}", e)))
}

/// Verify a token signature and expiry, returning its claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| Error::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key";

    #[test]
    fn token_round_trip_preserves_subject() {
        let token = issue_token("user-123", SECRET, 24).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_rejected_with_wrong_secret() {
        let token = issue_token("user-123", SECRET, 24).unwrap();
        let result = verify_token(&token, "a-different-secret");
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }

    #[test]
    fn expired_token_rejected() {
        // Issued already two hours past expiry, well beyond validation leeway
        let token = issue_token("user-123", SECRET, -2).unwrap();
        let result = verify_token(&token, SECRET);
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }

    #[test]
    fn tampered_token_rejected() {
        let token = issue_token("user-123", SECRET, 24).unwrap();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        parts[1] = format!("{}x", parts[1]);
        let result = verify_token(&parts.join("."), SECRET);
        assert!(result.is_err());
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(verify_token("not-a-token", SECRET).is_err());
        assert!(verify_token("", SECRET).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }
}
