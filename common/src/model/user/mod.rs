//! User models used by login and token issuance

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Stored user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// Store-assigned user ID
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Salted password hash (PHC string); never sent to clients
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login name
    pub username: String,
    /// Salted password hash (PHC string)
    pub password_hash: String,
}
