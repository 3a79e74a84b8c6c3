//! Application configuration

use std::env;
use std::net::SocketAddr;

use account_service::AccountServiceConfig;
use auth_service::AuthConfig;
use common::error::{Error, Result};

/// Listen address used when neither `BIND_ADDR` nor `PORT` is set
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// Database settings
    pub accounts: AccountServiceConfig,
    /// Token settings
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Create a new configuration from environment variables. Fails when the
    /// database URL or the JWT key is missing.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: bind_addr_from_env()?,
            accounts: AccountServiceConfig::from_env()?,
            auth: AuthConfig::from_env()?,
        })
    }
}

/// `BIND_ADDR` wins; a bare `PORT` listens on every interface
pub fn bind_addr_from_env() -> Result<SocketAddr> {
    let raw = match (env::var("BIND_ADDR"), env::var("PORT")) {
        (Ok(addr), _) => addr,
        (Err(_), Ok(port)) => format!("0.0.0.0:{}", port.trim()),
        _ => DEFAULT_BIND_ADDR.to_string(),
    };

    parse_addr(&raw)
}

/// Parse a listen address
pub fn parse_addr(raw: &str) -> Result<SocketAddr> {
    raw.trim()
        .parse()
        .map_err(|_| Error::ConfigurationError(format!("invalid listen address: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr("127.0.0.1:8080").unwrap().port(), 8080);
        assert!(matches!(parse_addr("localhost"), Err(Error::ConfigurationError(_))));
    }
}
