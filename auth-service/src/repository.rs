//! Repository for user credentials

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::error::{Error, ErrorExt, Result};
use common::model::user::{NewUser, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

/// User repository trait defining the interface for credential storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user; a taken username is a conflict
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Look a user up by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}

/// In-memory repository for user credentials
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<String, User>,
    last_id: AtomicI64,
}

impl InMemoryUserRepository {
    /// Create a new in-memory user repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(Error::Conflict(format!("username {} is taken", user.username))),
            Entry::Vacant(slot) => {
                let stored = User {
                    id: self.last_id.fetch_add(1, Ordering::SeqCst) + 1,
                    username: user.username,
                    password_hash: user.password_hash,
                    created_at: Utc::now(),
                };
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.get(username).map(|user| user.clone()))
    }
}

/// PostgreSQL repository for user credentials
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a repository on an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        debug!("Creating user {} in database", user.username);

        let row = sqlx::query(
            "INSERT INTO users (username, password) VALUES ($1, $2) \
             RETURNING id, username, password, created_at",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_db(e, format!("username {} is taken", user.username)))
        .with_context(|| "failed to create user")?;

        user_from_row(&row)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        debug!("Looking up user {}", username);

        let row = sqlx::query("SELECT id, username, password, created_at FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
            .with_context(|| format!("failed to look up user {}", username))?;

        row.as_ref().map(user_from_row).transpose()
    }
}
