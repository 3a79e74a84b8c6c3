use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tracing::info;

use crate::error::{Error, Result};

pub mod schema;
pub mod transaction;

// Re-export transaction types
pub use transaction::{
    DBTransaction, TransactionManager,
    PgTransaction, PgTransactionManager,
    InMemoryTransaction, InMemoryTransactionManager
};

/// Database pool type
pub type DbPool = Pool<Postgres>;

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<DbPool> {
    if database_url.trim().is_empty() {
        return Err(Error::ConfigurationError("database URL is empty".to_string()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    info!("Connected to PostgreSQL database with pool size: {}", max_connections);

    Ok(pool)
}
