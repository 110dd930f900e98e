pub mod password;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{SecurityConfig, MAX_TOKEN_EXPIRE_MINUTES};

pub use password::{hash_password, verify_password};

/// Signing algorithm, fixed for the lifetime of the process
const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token payload has no subject")]
    MissingSubject,

    #[error("Inactive user")]
    InactiveAccount,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// JWT claims carried by every access token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id, as a string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i64, lifetime: Duration) -> Self {
        let now = Utc::now();
        let exp = now.checked_add_signed(lifetime).unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            sub: Some(user_id.to_string()),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Issues and verifies stateless bearer tokens.
///
/// There is no revocation list: a token stays valid until `exp`, and logging
/// out is the client discarding it.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(
            &security.jwt_secret,
            Duration::minutes(security.access_token_expire_minutes.clamp(1, MAX_TOKEN_EXPIRE_MINUTES)),
        )
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn expires_in_seconds(&self) -> i64 {
        self.lifetime.num_seconds()
    }

    /// Issue a token for `user_id` with the configured lifetime
    pub fn issue(&self, user_id: i64) -> Result<String, AuthError> {
        self.issue_with_lifetime(user_id, self.lifetime)
    }

    /// Issue a token with an explicit lifetime; a negative lifetime yields a
    /// token that is already expired.
    pub fn issue_with_lifetime(&self, user_id: i64, lifetime: Duration) -> Result<String, AuthError> {
        let claims = Claims::new(user_id, lifetime);
        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the subject user id
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        let sub = token_data.claims.sub.ok_or(AuthError::MissingSubject)?;
        sub.parse::<i64>().map_err(|_| AuthError::InvalidToken)
    }
}
