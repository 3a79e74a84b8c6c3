//! Domain models for the bank ledger

pub mod account;
pub mod transfer;
pub mod user;
