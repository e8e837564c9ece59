//! services/api/src/credentials.rs
//!
//! Password hashing and bearer-token handling.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Failed to hash password: {0}")]
    Hash(String),
    #[error("Failed to encode token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

//=========================================================================================
// Passwords
//=========================================================================================

/// Hashes a password with Argon2id and a random salt.
///
/// The result is a PHC string, so the algorithm and its parameters travel
/// with the hash.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// Checks a password against a stored PHC string.
///
/// Malformed hashes verify as `false`.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Stored password hash is not a PHC string: {}", e);
            return false;
        }
    };
    let verifiers: [&dyn PasswordVerifier; 1] = [&Argon2::default()];
    parsed.verify_password(&verifiers, plain).is_ok()
}

//=========================================================================================
// Tokens
//=========================================================================================

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Issues and validates HS256 access tokens with the configured secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, default_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            default_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.secret_key, config.token_ttl)
    }

    /// Issues a token for `user_id` valid for the configured TTL.
    pub fn issue(&self, user_id: Uuid) -> Result<String, CredentialError> {
        self.issue_with_ttl(user_id, self.default_ttl)
    }

    pub fn issue_with_ttl(&self, user_id: Uuid, ttl: Duration) -> Result<String, CredentialError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)?)
    }

    /// Verifies signature and expiry. Any failure yields `None`.
    pub fn decode(&self, token: &str) -> Option<Claims> {
        let validation = Validation::new(SIGNING_ALGORITHM);
        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!("Rejected access token: {}", e);
                None
            }
        }
    }
}

//=========================================================================================
// Authorization header
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("Authorization header missing")]
    Missing,
    #[error("Invalid Authorization header format")]
    Malformed,
}

/// Extracts the token from an `Authorization` header value.
///
/// The value must be exactly two whitespace-separated parts, the first being
/// `bearer` in any case.
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str, BearerError> {
    let value = header_value.ok_or(BearerError::Missing)?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(BearerError::Malformed),
    }
}
