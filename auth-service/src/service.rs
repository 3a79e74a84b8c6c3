//! Auth service: user registration and username/password login

use std::sync::Arc;

use common::error::{Error, Result};
use common::model::user::{NewUser, User};
use tracing::{info, warn};

use crate::password::{hash_password, verify_password};
use crate::repository::{InMemoryUserRepository, UserRepository};
use crate::token::{Claims, TokenIssuer};

/// Maximum username length, matching the `users.username` column
pub const MAX_USERNAME_LEN: usize = 50;

const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Exchanges credentials for bearer tokens
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
}

impl AuthService {
    /// Create an auth service on top of a user repository
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    /// Create an auth service with an empty in-memory user store
    pub fn in_memory(tokens: TokenIssuer) -> Self {
        Self::new(Arc::new(InMemoryUserRepository::new()), tokens)
    }

    /// Register a user, storing only a salted hash of the password
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(Error::ValidationError("username and password are required".to_string()));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(Error::ValidationError(format!(
                "username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| Error::Internal(format!("password hashing task failed: {}", e)))??;

        let user = self
            .users
            .create_user(NewUser {
                username: username.to_string(),
                password_hash,
            })
            .await?;

        info!("Registered user {}", user.username);
        Ok(user)
    }

    /// Verify credentials and issue a token; unknown users and wrong
    /// passwords fail with the same error.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(Error::ValidationError("username and password are required".to_string()));
        }

        let Some(user) = self.users.find_by_username(username.trim()).await? else {
            warn!("Login rejected for unknown user");
            return Err(Error::AuthenticationError(INVALID_CREDENTIALS.to_string()));
        };

        let password = password.to_string();
        let stored_hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| Error::Internal(format!("password check task failed: {}", e)))??;

        if !matches {
            warn!("Login rejected for user {}", user.username);
            return Err(Error::AuthenticationError(INVALID_CREDENTIALS.to_string()));
        }

        info!("User {} logged in", user.username);
        self.tokens.issue(&user.username)
    }

    /// Validate a bearer token
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        self.tokens.validate(token)
    }
}
