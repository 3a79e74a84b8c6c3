//! Decimal type utilities for exact money arithmetic

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

use crate::error::{Error, Result};

/// Money amount (balances and transfer amounts)
pub type Amount = Decimal;

/// Precision helpers for money values
pub mod precision {
    use super::*;

    /// Fractional digits stored for balances (`DECIMAL(15, 2)`)
    pub const MONEY_SCALE: u32 = 2;

    /// Largest value a `DECIMAL(15, 2)` column holds
    pub const MAX_AMOUNT: Amount = dec!(9999999999999.99);

    /// Reject amounts that carry more fractional digits than the store keeps
    pub fn ensure_money_scale(amount: Amount) -> Result<Amount> {
        if amount.normalize().scale() > MONEY_SCALE {
            return Err(Error::ValidationError(format!(
                "amount {} has more than {} decimal places",
                amount, MONEY_SCALE
            )));
        }
        Ok(amount)
    }

    /// Reject amounts the store column cannot hold
    pub fn ensure_within_max(amount: Amount) -> Result<Amount> {
        if amount > MAX_AMOUNT {
            return Err(Error::ValidationError(format!(
                "amount {} exceeds the maximum of {}",
                amount, MAX_AMOUNT
            )));
        }
        Ok(amount)
    }
}
