//! Auth utility: password hashing, user storage and bearer tokens

pub mod config;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};
pub use service::AuthService;
pub use token::{Claims, TokenIssuer};
