//! Account service: the account store and the funds transfer operation

pub mod service;
pub mod repository;
pub mod config;

pub use service::AccountService;
pub use repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};
pub use config::AccountServiceConfig;
