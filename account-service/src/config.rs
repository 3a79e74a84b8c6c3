//! Configuration for the account service

use std::env;
use std::time::Duration;

use common::db::{init_db_pool, schema, DbPool};
use common::error::{Error, Result};

/// Default database connection pool size
pub const DEFAULT_POOL_SIZE: u32 = 5;

/// Default deadline for a single store call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Configuration for the account service
#[derive(Debug, Clone)]
pub struct AccountServiceConfig {
    /// Database URL
    pub database_url: String,
    /// Database connection pool size
    pub db_pool_size: u32,
    /// Deadline applied to every store call
    pub request_timeout: Duration,
}

impl AccountServiceConfig {
    /// Create a new configuration using environment variables.
    ///
    /// `POSTGRES_URL` (or `DATABASE_URL`) is required; `DB_POOL_SIZE` and
    /// `REQUEST_TIMEOUT_MS` fall back to defaults when unset.
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("POSTGRES_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .ok()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::ConfigurationError("POSTGRES_URL must be set".to_string()))?;

        let db_pool_size = parse_var("DB_POOL_SIZE")?.unwrap_or(DEFAULT_POOL_SIZE);
        let request_timeout = parse_var::<u64>("REQUEST_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Ok(Self::new(database_url, db_pool_size, request_timeout))
    }

    /// Create a new configuration with custom values
    pub fn new(database_url: String, db_pool_size: u32, request_timeout: Duration) -> Self {
        Self {
            database_url,
            db_pool_size,
            request_timeout,
        }
    }

    /// Open the connection pool and make sure the tables exist.
    ///
    /// Acquiring a connection is bounded by the same deadline as store calls.
    pub async fn connect(&self) -> Result<DbPool> {
        let pool = init_db_pool(&self.database_url, self.db_pool_size, self.request_timeout).await?;
        schema::ensure_schema(&pool).await?;
        Ok(pool)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::ConfigurationError(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(None),
    }
}
