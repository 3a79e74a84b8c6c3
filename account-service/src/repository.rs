//! Repository for account data

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::db::{InMemoryTransactionManager, PgTransactionManager};
use common::decimal::Amount;
use common::error::{Error, ErrorExt, Result};
use common::model::account::{Account, NewAccount};
use common::{DBTransaction, TransactionManager};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tokio::sync::Mutex;
use tracing::debug;

const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, number, balance, created_at";

/// Account repository trait defining the interface for account data storage
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Create a new account; the store assigns the ID and creation time
    async fn create_account(&self, account: NewAccount) -> Result<Account>;

    /// Get an account by ID
    async fn get_account(&self, id: i64) -> Result<Option<Account>>;

    /// Delete an account by ID, returning whether a row was removed
    async fn delete_account(&self, id: i64) -> Result<bool>;

    /// Overwrite the mutable fields of an existing account
    async fn update_account(&self, account: &Account) -> Result<Account>;

    /// All accounts with the given ID (zero or one, since ID is the key)
    async fn list_accounts_by_id(&self, id: i64) -> Result<Vec<Account>>;

    /// Lock an account row for the rest of the transaction and read it
    async fn lock_account(&self, tx: &mut DBTransaction, id: i64) -> Result<Option<Account>>;

    /// Write a new balance for a row locked by `tx`
    async fn update_balance(&self, tx: &mut DBTransaction, id: i64, balance: Amount) -> Result<()>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

/// In-memory repository for account data
pub struct InMemoryAccountRepository {
    /// Accounts by ID
    pub accounts: Arc<DashMap<i64, Account>>,
    /// Account IDs by account number (uniqueness index)
    numbers: DashMap<String, i64>,
    /// Per-account locks, the in-memory stand-in for row locks
    row_locks: DashMap<i64, Arc<Mutex<()>>>,
    /// Last assigned ID
    last_id: AtomicI64,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccountRepository {
    /// Create a new in-memory account repository
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(DashMap::new()),
            numbers: DashMap::new(),
            row_locks: DashMap::new(),
            last_id: AtomicI64::new(0),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }

    /// Number of per-account locks currently tracked
    pub fn tracked_row_locks(&self) -> usize {
        self.row_locks.len()
    }

    fn row_lock(&self, id: i64) -> Arc<Mutex<()>> {
        Arc::clone(&self.row_locks.entry(id).or_default())
    }

    /// Drop the lock entry of a removed row unless another caller still holds
    /// or waits on it
    fn release_row_lock(&self, id: i64) {
        self.row_locks.remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account> {
        match self.numbers.entry(account.number.clone()) {
            Entry::Occupied(_) => Err(Error::Conflict(format!(
                "account number {} already exists",
                account.number
            ))),
            Entry::Vacant(slot) => {
                let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
                let account = Account {
                    id,
                    first_name: account.first_name,
                    last_name: account.last_name,
                    number: account.number,
                    balance: account.balance,
                    created_at: Utc::now(),
                };

                slot.insert(id);
                self.accounts.insert(id, account.clone());
                Ok(account)
            }
        }
    }

    async fn get_account(&self, id: i64) -> Result<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn delete_account(&self, id: i64) -> Result<bool> {
        let lock = self.row_lock(id);
        let guard = lock.lock().await;

        let removed = match self.accounts.remove(&id) {
            Some((_, account)) => {
                self.numbers.remove(&account.number);
                true
            }
            None => false,
        };

        drop(guard);
        drop(lock);
        self.release_row_lock(id);
        Ok(removed)
    }

    async fn update_account(&self, account: &Account) -> Result<Account> {
        let lock = self.row_lock(account.id);
        let guard = lock.lock().await;

        let Some(current) = self.accounts.get(&account.id).map(|a| a.clone()) else {
            drop(guard);
            drop(lock);
            self.release_row_lock(account.id);
            return Err(Error::AccountNotFound(account.id.to_string()));
        };

        if current.number != account.number {
            match self.numbers.entry(account.number.clone()) {
                Entry::Occupied(_) => {
                    return Err(Error::Conflict(format!(
                        "account number {} already exists",
                        account.number
                    )))
                }
                Entry::Vacant(slot) => {
                    slot.insert(account.id);
                }
            }
            self.numbers.remove(&current.number);
        }

        // The creation time belongs to the store
        let updated = Account {
            created_at: current.created_at,
            ..account.clone()
        };
        self.accounts.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn list_accounts_by_id(&self, id: i64) -> Result<Vec<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()).into_iter().collect())
    }

    async fn lock_account(&self, tx: &mut DBTransaction, id: i64) -> Result<Option<Account>> {
        let tx = tx.as_in_memory()?;
        if !tx.holds(id) {
            let guard = self.row_lock(id).lock_owned().await;
            tx.hold(id, guard);
        }

        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn update_balance(&self, tx: &mut DBTransaction, id: i64, balance: Amount) -> Result<()> {
        let tx = tx.as_in_memory()?;
        if !tx.holds(id) {
            return Err(Error::Internal(format!(
                "account {} is not locked by this transaction",
                id
            )));
        }

        let accounts = Arc::clone(&self.accounts);
        tx.stage(move || {
            if let Some(mut row) = accounts.get_mut(&id) {
                row.balance = balance;
            }
        });
        Ok(())
    }
}

/// PostgreSQL repository for account data
pub struct PostgresAccountRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresAccountRepository {
    /// Create a repository on an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        }
    }
}

fn account_from_row(row: &PgRow) -> Result<Account> {
    Ok(Account {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        number: row.try_get("number")?,
        balance: row.try_get("balance")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account> {
        debug!("Creating account {} in database", account.number);

        let row = sqlx::query(&format!(
            "INSERT INTO account (first_name, last_name, number, balance)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.number)
        .bind(account.balance)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_db(e, format!("account number {} already exists", account.number)))
        .with_context(|| "failed to create account")?;

        account_from_row(&row)
    }

    async fn get_account(&self, id: i64) -> Result<Option<Account>> {
        debug!("Getting account from database: {}", id);

        let row = sqlx::query(&format!("SELECT {} FROM account WHERE id = $1", ACCOUNT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
            .with_context(|| format!("failed to get account {}", id))?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn delete_account(&self, id: i64) -> Result<bool> {
        debug!("Deleting account from database: {}", id);

        let result = sqlx::query("DELETE FROM account WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)
            .with_context(|| format!("failed to delete account {}", id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_account(&self, account: &Account) -> Result<Account> {
        debug!("Updating account in database: {}", account.id);

        let row = sqlx::query(&format!(
            "UPDATE account
             SET first_name = $1, last_name = $2, number = $3, balance = $4
             WHERE id = $5
             RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.number)
        .bind(account.balance)
        .bind(account.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::from_db(e, format!("account number {} already exists", account.number)))
        .with_context(|| format!("failed to update account {}", account.id))?
        .ok_or_else(|| Error::AccountNotFound(account.id.to_string()))?;

        account_from_row(&row)
    }

    async fn list_accounts_by_id(&self, id: i64) -> Result<Vec<Account>> {
        debug!("Listing accounts with id: {}", id);

        let rows = sqlx::query(&format!("SELECT {} FROM account WHERE id = $1", ACCOUNT_COLUMNS))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
            .with_context(|| format!("failed to list accounts with id {}", id))?;

        rows.iter().map(account_from_row).collect()
    }

    async fn lock_account(&self, tx: &mut DBTransaction, id: i64) -> Result<Option<Account>> {
        debug!("Locking account row: {}", id);

        let tx = tx.as_postgres()?;
        let row = sqlx::query(&format!(
            "SELECT {} FROM account WHERE id = $1 FOR UPDATE",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(tx.connection())
        .await
        .map_err(Error::Database)
        .with_context(|| format!("failed to lock account {}", id))?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn update_balance(&self, tx: &mut DBTransaction, id: i64, balance: Amount) -> Result<()> {
        debug!("Updating balance of account {} to {}", id, balance);

        let tx = tx.as_postgres()?;
        let result = sqlx::query("UPDATE account SET balance = $1 WHERE id = $2")
            .bind(balance)
            .bind(id)
            .execute(tx.connection())
            .await
            .map_err(Error::Database)
            .with_context(|| format!("failed to update balance of account {}", id))?;

        if result.rows_affected() == 0 {
            return Err(Error::AccountNotFound(id.to_string()));
        }
        Ok(())
    }
}
