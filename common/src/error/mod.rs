//! Error types for the bank ledger
//!
//! This module provides a unified error handling system shared by the account
//! store, the transfer operation, the auth utility and the HTTP layer. It
//! defines standard error types that can be used across crate boundaries and
//! provides consistent error conversion.

use std::fmt::Display;

use rust_decimal::Decimal;
use thiserror::Error;

/// SQLSTATE reported by Postgres for a unique constraint violation
const UNIQUE_VIOLATION: &str = "23505";

/// Bank ledger error type
#[derive(Debug, Error)]
pub enum Error {
    /// Generic validation error (bad input shape or value)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Transfer whose source and destination are the same account
    #[error("Cannot transfer to the same account: {0}")]
    SameAccountTransfer(i64),

    /// Transfer of a zero or negative amount
    #[error("Transfer amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Error when an account has insufficient funds
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Error when an account cannot be found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Uniqueness or other constraint conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad credentials or an invalid token
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A storage call did not finish within its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

impl Error {
    /// Translate a driver error, turning unique violations into [`Error::Conflict`]
    pub fn from_db(err: sqlx::Error, conflict_message: impl Into<String>) -> Self {
        let is_unique_violation = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code == UNIQUE_VIOLATION)
            .unwrap_or(false);

        if is_unique_violation {
            Error::Conflict(conflict_message.into())
        } else {
            Error::Database(err)
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::InsufficientBalance(msg) => Error::InsufficientBalance(format!("{}: {}", context, msg)),
                Error::AccountNotFound(msg) => Error::AccountNotFound(format!("{}: {}", context, msg)),
                Error::Conflict(msg) => Error::Conflict(format!("{}: {}", context, msg)),
                Error::AuthenticationError(msg) => Error::AuthenticationError(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Timeout(msg) => Error::Timeout(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Internal(format!("{}: {}", context, e)),
                e @ (Error::SameAccountTransfer(_)
                | Error::NonPositiveAmount(_)
                | Error::Serialization(_)) => e,
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}
