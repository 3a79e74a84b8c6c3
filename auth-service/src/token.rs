//! Bearer token issuance and validation (HS256 JWT)

use chrono::{Duration, Utc};
use common::error::{Error, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Claims carried by issued tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to
    pub sub: String,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// Signs and verifies tokens with one HMAC secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer; an empty secret, a non-positive lifetime, or one
    /// that pushes expiry past the representable range is a configuration
    /// error.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::ConfigurationError("JWT key is not configured".to_string()));
        }
        if ttl <= Duration::zero() {
            return Err(Error::ConfigurationError(format!("token lifetime must be positive, got {}", ttl)));
        }
        if Utc::now().checked_add_signed(ttl).is_none() {
            return Err(Error::ConfigurationError(format!("token lifetime is too large: {}", ttl)));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// Create an issuer from configuration
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(&config.jwt_key, config.token_ttl)
    }

    /// Issue a token for `username`
    pub fn issue(&self, username: &str) -> Result<String> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| Error::Internal(format!("token expiry overflows with lifetime {}", self.ttl)))?;
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("failed to sign token: {}", e)))
    }

    /// Check signature, algorithm and expiry, and return the claims
    pub fn validate(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| Error::AuthenticationError(format!("invalid token: {}", e)))
    }
}
