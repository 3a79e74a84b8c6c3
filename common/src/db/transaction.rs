//! Transaction handling for database operations
//!
//! This module provides a standardized approach to database transactions
//! for every store. It defines a trait for transaction management and two
//! concrete units of work: a PostgreSQL transaction, and an in-memory one
//! that holds per-row locks and applies staged writes on commit.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction as SqlxTransaction};
use tokio::sync::OwnedMutexGuard;

use crate::error::{Error, Result};

/// Transaction enum that can be either PostgreSQL or in-memory
pub enum DBTransaction {
    /// PostgreSQL transaction
    Postgres(PgTransaction),
    /// In-memory transaction
    InMemory(InMemoryTransaction),
}

impl fmt::Debug for DBTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DBTransaction::Postgres(_) => f.write_str("DBTransaction::Postgres"),
            DBTransaction::InMemory(tx) => f
                .debug_struct("DBTransaction::InMemory")
                .field("locked", &tx.locked.len())
                .field("staged", &tx.staged.len())
                .finish(),
        }
    }
}

/// Transaction interface methods
impl DBTransaction {
    /// Commit the transaction
    pub async fn commit(self) -> Result<()> {
        match self {
            DBTransaction::Postgres(tx) => tx.commit().await,
            DBTransaction::InMemory(tx) => tx.commit().await,
        }
    }

    /// Rollback the transaction
    pub async fn rollback(self) -> Result<()> {
        match self {
            DBTransaction::Postgres(tx) => tx.rollback().await,
            DBTransaction::InMemory(tx) => tx.rollback().await,
        }
    }

    /// Borrow the PostgreSQL transaction, failing for any other kind
    pub fn as_postgres(&mut self) -> Result<&mut PgTransaction> {
        match self {
            DBTransaction::Postgres(tx) => Ok(tx),
            DBTransaction::InMemory(_) => Err(Error::Internal(
                "expected a PostgreSQL transaction, got an in-memory one".to_string(),
            )),
        }
    }

    /// Borrow the in-memory transaction, failing for any other kind
    pub fn as_in_memory(&mut self) -> Result<&mut InMemoryTransaction> {
        match self {
            DBTransaction::InMemory(tx) => Ok(tx),
            DBTransaction::Postgres(_) => Err(Error::Internal(
                "expected an in-memory transaction, got a PostgreSQL one".to_string(),
            )),
        }
    }
}

/// A PostgreSQL transaction implementation
pub struct PgTransaction {
    tx: SqlxTransaction<'static, Postgres>,
}

impl PgTransaction {
    /// Create a new PgTransaction
    pub fn new(tx: SqlxTransaction<'static, Postgres>) -> Self {
        Self { tx }
    }

    /// Connection to run statements on inside this transaction
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    /// Commit the transaction
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(Error::Database)
    }

    /// Rollback the transaction
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(Error::Database)
    }
}

/// Transaction manager trait for creating and managing transactions
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<DBTransaction>;
}

/// A PostgreSQL transaction manager implementation
pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    /// Create a new PgTransactionManager
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        let tx = self.pool.begin().await.map_err(Error::Database)?;
        Ok(DBTransaction::Postgres(PgTransaction::new(tx)))
    }
}

type StagedWrite = Box<dyn FnOnce() + Send>;

/// In-memory unit of work.
///
/// Row locks are held until the transaction ends. Writes are staged and only
/// applied, in order, on commit; rollback (or drop) discards them.
#[derive(Default)]
pub struct InMemoryTransaction {
    locked: HashSet<i64>,
    guards: Vec<OwnedMutexGuard<()>>,
    staged: Vec<StagedWrite>,
}

impl InMemoryTransaction {
    /// Create a new in-memory transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this transaction already holds the lock for `key`
    pub fn holds(&self, key: i64) -> bool {
        self.locked.contains(&key)
    }

    /// Keep a row lock until commit or rollback
    pub fn hold(&mut self, key: i64, guard: OwnedMutexGuard<()>) {
        self.locked.insert(key);
        self.guards.push(guard);
    }

    /// Queue a write to apply on commit
    pub fn stage<F>(&mut self, write: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.staged.push(Box::new(write));
    }

    /// Number of writes waiting for commit
    pub fn staged_writes(&self) -> usize {
        self.staged.len()
    }

    /// Commit the transaction
    pub async fn commit(self) -> Result<()> {
        let InMemoryTransaction { guards, staged, .. } = self;
        for write in staged {
            write();
        }
        // Locks are released only after every write is visible
        drop(guards);
        Ok(())
    }

    /// Rollback the transaction
    pub async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

/// In-memory transaction manager for testing
#[derive(Default)]
pub struct InMemoryTransactionManager;

impl InMemoryTransactionManager {
    /// Create a new in-memory transaction manager
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransactionManager for InMemoryTransactionManager {
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        Ok(DBTransaction::InMemory(InMemoryTransaction::new()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use super::*;

    #[tokio::test]
    async fn commit_applies_staged_writes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut tx = InMemoryTransactionManager::new().begin_transaction().await.unwrap();

        let inner = tx.as_in_memory().unwrap();
        for _ in 0..2 {
            let counter = counter.clone();
            inner.stage(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(inner.staged_writes(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tx.commit().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rollback_discards_writes_and_releases_locks() {
        let row_lock = Arc::new(Mutex::new(()));
        let counter = Arc::new(AtomicUsize::new(0));

        let mut tx = InMemoryTransaction::new();
        tx.hold(1, row_lock.clone().lock_owned().await);
        assert!(tx.holds(1));
        assert!(row_lock.try_lock().is_err());

        let staged = counter.clone();
        tx.stage(move || {
            staged.fetch_add(1, Ordering::SeqCst);
        });
        tx.rollback().await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(row_lock.try_lock().is_ok());
    }

    #[tokio::test]
    async fn kind_mismatch_is_an_error() {
        let mut tx = DBTransaction::InMemory(InMemoryTransaction::new());
        assert!(tx.as_postgres().is_err());
        assert!(tx.as_in_memory().is_ok());
    }
}
