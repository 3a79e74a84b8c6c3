//! Table definitions created at startup

use sqlx::PgPool;
use tracing::debug;

use crate::error::{IntoError, Result};

/// Account table; `number` is the external, unique account number
pub const CREATE_ACCOUNT_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS account (
        id BIGSERIAL PRIMARY KEY,
        first_name VARCHAR(50) NOT NULL,
        last_name VARCHAR(50) NOT NULL,
        number VARCHAR(20) NOT NULL UNIQUE,
        balance DECIMAL(15, 2) NOT NULL DEFAULT 0.00,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )";

/// Users table for login; `password` holds a salted hash
pub const CREATE_USERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username VARCHAR(50) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )";

/// Create the account and users tables if they do not exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    debug!("Ensuring account table exists");
    sqlx::query(CREATE_ACCOUNT_TABLE)
        .execute(pool)
        .await
        .map_err(|e| e.into_error("failed to create account table"))?;

    debug!("Ensuring users table exists");
    sqlx::query(CREATE_USERS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| e.into_error("failed to create users table"))?;

    Ok(())
}
