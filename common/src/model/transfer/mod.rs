//! Funds transfer request and receipt

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{precision, Amount};
use crate::error::{Error, Result};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Request to move `amount` from one account to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct TransferRequest {
    /// Account to debit
    pub from_account_id: i64,
    /// Account to credit
    pub to_account_id: i64,
    /// Amount to move; must be positive
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "40.00"))]
    pub amount: Amount,
}

impl TransferRequest {
    /// Checks that need no store access, in order: distinct accounts, then a
    /// positive amount, then the money scale and the column maximum.
    pub fn validate(&self) -> Result<()> {
        if self.from_account_id == self.to_account_id {
            return Err(Error::SameAccountTransfer(self.from_account_id));
        }
        if self.amount <= Amount::ZERO {
            return Err(Error::NonPositiveAmount(self.amount));
        }
        precision::ensure_money_scale(self.amount)?;
        precision::ensure_within_max(self.amount)?;
        Ok(())
    }
}

/// Outcome of an accepted transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct TransferReceipt {
    /// Debited account
    pub from_account_id: i64,
    /// Credited account
    pub to_account_id: i64,
    /// Debited account's balance after the transfer
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "60.00"))]
    pub from_balance: Amount,
    /// Credited account's balance after the transfer
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "90.00"))]
    pub to_balance: Amount,
    /// Amount moved
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "40.00"))]
    pub amount: Amount,
    /// When the transfer was accepted
    pub transferred_at: DateTime<Utc>,
}
