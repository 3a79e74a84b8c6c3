//! Account service implementation

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::error::{Error, ErrorExt, Result};
use common::model::account::{Account, NewAccount};
use common::model::transfer::{TransferReceipt, TransferRequest};
use common::DBTransaction;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};

use crate::config::{AccountServiceConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};

/// Account service: account CRUD and the funds transfer operation
pub struct AccountService {
    /// Repository for account data
    repo: Arc<dyn AccountRepository>,
    /// Deadline applied to every store call
    request_timeout: Duration,
}

impl Default for AccountService {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountService {
    /// Create a new account service backed by the in-memory repository
    pub fn new() -> Self {
        Self::from_repository(Arc::new(InMemoryAccountRepository::new()))
    }

    /// Create a new account service on top of an existing repository
    pub fn from_repository(repo: Arc<dyn AccountRepository>) -> Self {
        Self {
            repo,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create a Postgres-backed account service on a shared pool, with the
    /// configured per-call deadline
    pub fn with_config(config: &AccountServiceConfig, pool: PgPool) -> Self {
        Self::from_repository(Arc::new(PostgresAccountRepository::from_pool(pool)))
            .with_request_timeout(config.request_timeout)
    }

    /// Replace the per-call store deadline
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Create a new account
    pub async fn create_account(&self, account: NewAccount) -> Result<Account> {
        account.validate()?;
        info!("Creating account {}", account.number);

        let account = self
            .within_deadline("create account", self.repo.create_account(account))
            .await?;

        info!("Created account {} with id {}", account.number, account.id);
        Ok(account)
    }

    /// Get an account by ID
    pub async fn get_account(&self, id: i64) -> Result<Option<Account>> {
        self.within_deadline("get account", self.repo.get_account(id)).await
    }

    /// Delete an account by ID
    pub async fn delete_account(&self, id: i64) -> Result<()> {
        info!("Deleting account {}", id);

        let deleted = self
            .within_deadline("delete account", self.repo.delete_account(id))
            .await?;

        if !deleted {
            return Err(Error::AccountNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Update an existing account's holder details, number or balance
    pub async fn update_account(&self, account: &Account) -> Result<Account> {
        NewAccount {
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            number: account.number.clone(),
            balance: account.balance,
        }
        .validate()?;
        info!("Updating account {}", account.id);

        self.within_deadline("update account", self.repo.update_account(account))
            .await
    }

    /// All accounts with the given ID
    pub async fn list_accounts_by_id(&self, id: i64) -> Result<Vec<Account>> {
        self.within_deadline("list accounts", self.repo.list_accounts_by_id(id))
            .await
    }

    /// Move funds between two accounts as one atomic unit.
    ///
    /// Checks run in order and the first failure wins: distinct accounts,
    /// positive amount, source exists, destination exists, sufficient
    /// balance. Both rows are locked before the balance is checked, so
    /// concurrent transfers touching the same account serialize.
    pub async fn transfer(&self, request: &TransferRequest) -> Result<TransferReceipt> {
        request.validate()?;
        info!(
            "Transferring {} from account {} to account {}",
            request.amount, request.from_account_id, request.to_account_id
        );

        let result = self
            .within_deadline("transfer", self.execute_transfer(request))
            .await;

        match &result {
            Ok(receipt) => info!(
                "Transfer accepted: {} -> {} ({}), balances {} / {}",
                receipt.from_account_id,
                receipt.to_account_id,
                receipt.amount,
                receipt.from_balance,
                receipt.to_balance
            ),
            Err(e) => warn!(
                "Transfer from {} to {} rejected: {}",
                request.from_account_id, request.to_account_id, e
            ),
        }

        result
    }

    async fn execute_transfer(&self, request: &TransferRequest) -> Result<TransferReceipt> {
        let mut transaction = self.repo.begin_transaction().await
            .with_context(|| "Failed to start transfer transaction")?;

        match self.apply_transfer(&mut transaction, request).await {
            Ok(receipt) => {
                transaction.commit().await
                    .with_context(|| "Failed to commit transfer")?;
                Ok(receipt)
            },
            Err(e) => {
                if let Err(rollback_err) = transaction.rollback().await {
                    // Log rollback failure but return the original error
                    error!("Failed to roll back transfer: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn apply_transfer(&self, tx: &mut DBTransaction, request: &TransferRequest) -> Result<TransferReceipt> {
        let from_id = request.from_account_id;
        let to_id = request.to_account_id;

        // Lock in ascending id order so opposing transfers cannot deadlock
        let (first, second) = if from_id < to_id { (from_id, to_id) } else { (to_id, from_id) };
        debug!("Locking accounts {} and {}", first, second);
        let first_row = self.repo.lock_account(tx, first).await?;
        let second_row = self.repo.lock_account(tx, second).await?;
        let (source, destination) = if first == from_id {
            (first_row, second_row)
        } else {
            (second_row, first_row)
        };

        let mut source = source
            .ok_or_else(|| Error::AccountNotFound(format!("source account {}", from_id)))?;
        let mut destination = destination
            .ok_or_else(|| Error::AccountNotFound(format!("destination account {}", to_id)))?;

        source.debit(request.amount)?;
        destination.credit(request.amount)?;

        self.repo.update_balance(tx, source.id, source.balance).await
            .with_context(|| format!("Failed to debit account {}", source.id))?;
        self.repo.update_balance(tx, destination.id, destination.balance).await
            .with_context(|| format!("Failed to credit account {}", destination.id))?;

        Ok(TransferReceipt {
            from_account_id: source.id,
            to_account_id: destination.id,
            from_balance: source.balance,
            to_balance: destination.balance,
            amount: request.amount,
            transferred_at: Utc::now(),
        })
    }

    async fn within_deadline<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "{} did not finish within {:?}",
                operation, self.request_timeout
            ))),
        }
    }
}
