//! Account models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{precision, Amount};
use crate::error::{Error, Result};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Longest first or last name the store accepts
pub const MAX_NAME_LEN: usize = 50;

/// Longest account number the store accepts
pub const MAX_NUMBER_LEN: usize = 20;

/// Account model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Account {
    /// Store-assigned account ID
    pub id: i64,
    /// Holder's first name
    pub first_name: String,
    /// Holder's last name
    pub last_name: String,
    /// External-facing account number, unique across the store
    pub number: String,
    /// Current balance
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "100.00"))]
    pub balance: Amount,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Remove funds from the balance
    pub fn debit(&mut self, amount: Amount) -> Result<()> {
        if amount > self.balance {
            return Err(Error::InsufficientBalance(format!(
                "account {} holds {}, cannot debit {}",
                self.id, self.balance, amount
            )));
        }

        self.balance -= amount;
        Ok(())
    }

    /// Add funds to the balance; the result must still fit the store column
    pub fn credit(&mut self, amount: Amount) -> Result<()> {
        let balance = self.balance.checked_add(amount).ok_or_else(|| {
            Error::DecimalError(format!("balance of account {} overflowed", self.id))
        })?;
        precision::ensure_within_max(balance).map_err(|_| {
            Error::ValidationError(format!(
                "crediting {} would take account {} above the maximum balance of {}",
                amount,
                self.id,
                precision::MAX_AMOUNT
            ))
        })?;

        self.balance = balance;
        Ok(())
    }
}

/// Fields supplied when opening an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct NewAccount {
    /// Holder's first name
    pub first_name: String,
    /// Holder's last name
    pub last_name: String,
    /// External-facing account number
    pub number: String,
    /// Opening balance (zero allowed)
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "0.00"))]
    pub balance: Amount,
}

impl NewAccount {
    /// Check field shapes and the opening balance
    pub fn validate(&self) -> Result<()> {
        check_text("first_name", &self.first_name, MAX_NAME_LEN)?;
        check_text("last_name", &self.last_name, MAX_NAME_LEN)?;
        check_text("number", &self.number, MAX_NUMBER_LEN)?;

        if self.balance < Amount::ZERO {
            return Err(Error::ValidationError(format!(
                "opening balance cannot be negative, got {}",
                self.balance
            )));
        }
        precision::ensure_money_scale(self.balance)?;
        precision::ensure_within_max(self.balance)?;

        Ok(())
    }
}

fn check_text(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::ValidationError(format!("{} must not be empty", field)));
    }
    if value.chars().count() > max_len {
        return Err(Error::ValidationError(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::dec;

    fn new_account(balance: Amount) -> NewAccount {
        NewAccount {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            number: "1234567890".to_string(),
            balance,
        }
    }

    #[test]
    fn zero_opening_balance_is_allowed() {
        assert!(new_account(dec!(0)).validate().is_ok());
    }

    #[test]
    fn negative_opening_balance_is_rejected() {
        let err = new_account(dec!(-1)).validate().unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[test]
    fn blank_and_oversized_fields_are_rejected() {
        let mut blank = new_account(dec!(10));
        blank.last_name = "   ".to_string();
        assert!(blank.validate().is_err());

        let mut long_number = new_account(dec!(10));
        long_number.number = "1".repeat(MAX_NUMBER_LEN + 1);
        assert!(long_number.validate().is_err());
    }

    #[test]
    fn debit_never_goes_below_zero() {
        let mut account = Account {
            id: 1,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            number: "1".to_string(),
            balance: dec!(30),
            created_at: Utc::now(),
        };

        assert!(account.debit(dec!(40)).is_err());
        assert_eq!(account.balance, dec!(30));

        account.debit(dec!(30)).unwrap();
        account.credit(dec!(5)).unwrap();
        assert_eq!(account.balance, dec!(5));
    }

    #[test]
    fn opening_balance_above_column_maximum_is_rejected() {
        assert!(new_account(precision::MAX_AMOUNT).validate().is_ok());

        let err = new_account(dec!(100000000000000)).validate().unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[test]
    fn credit_past_maximum_leaves_balance_untouched() {
        let mut account = Account {
            id: 2,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            number: "2".to_string(),
            balance: precision::MAX_AMOUNT,
            created_at: Utc::now(),
        };

        assert!(matches!(account.credit(dec!(0.01)), Err(Error::ValidationError(_))));
        assert_eq!(account.balance, precision::MAX_AMOUNT);

        account.balance = Amount::MAX;
        assert!(account.credit(dec!(1)).is_err());
        assert_eq!(account.balance, Amount::MAX);
    }
}
