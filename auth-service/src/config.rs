//! Configuration for the auth utility

use std::env;
use std::fmt;

use chrono::Duration;
use common::error::{Error, Result};

/// Default token lifetime (one hour)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3_600;

/// Configuration for token issuance
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify tokens
    pub jwt_key: String,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_key", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl AuthConfig {
    /// Read `JWT_KEY` (required) and `TOKEN_TTL_SECS` from the environment
    pub fn from_env() -> Result<Self> {
        let jwt_key = env::var("JWT_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::ConfigurationError("JWT_KEY must be set".to_string()))?;

        let ttl_secs = match env::var("TOKEN_TTL_SECS") {
            Ok(raw) => raw.trim().parse::<i64>().map_err(|_| {
                Error::ConfigurationError(format!("TOKEN_TTL_SECS has an invalid value: {}", raw))
            })?,
            Err(_) => DEFAULT_TOKEN_TTL_SECS,
        };

        let token_ttl = Duration::try_seconds(ttl_secs).ok_or_else(|| {
            Error::ConfigurationError(format!("TOKEN_TTL_SECS is out of range: {}", ttl_secs))
        })?;

        Ok(Self::new(jwt_key, token_ttl))
    }

    /// Create a configuration with explicit values
    pub fn new(jwt_key: String, token_ttl: Duration) -> Self {
        Self { jwt_key, token_ttl }
    }
}
