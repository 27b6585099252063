#![forbid(unsafe_code)]

mod batch;
mod blocks;
mod config;
mod error;
mod files;
mod pool;
mod requests;
mod support;
mod tree;
mod types;
mod workspaces;

pub use config::*;
pub use error::{ErrorKind, StoreError};
pub use files::*;
pub use pool::*;
pub use requests::*;
pub use types::*;

use rusqlite::{Transaction, TransactionBehavior};
use std::sync::Arc;
use support::*;

/// Block-tree storage engine over an injected connection pool.
///
/// Every mutation holds one pooled connection for one `IMMEDIATE` transaction; every
/// multi-statement read runs in one deferred transaction. The connection goes back to the
/// pool on all exit paths.
pub struct SqliteStore<P: ConnectionPool = SqlitePool> {
    pool: P,
    files: Arc<dyn FileStore>,
    position_policy: PositionPolicy,
}

impl<P: ConnectionPool + std::fmt::Debug> std::fmt::Debug for SqliteStore<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("pool", &self.pool)
            .field("position_policy", &self.position_policy)
            .finish_non_exhaustive()
    }
}

impl SqliteStore<SqlitePool> {
    /// Opens (creating if needed) the database under `config.storage_dir` and installs the
    /// schema.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        std::fs::create_dir_all(&config.storage_dir)?;
        let pool = SqlitePool::new(
            config.db_path(),
            SqlitePoolOptions {
                max_size: config.pool_size,
                acquire_timeout: config.acquire_timeout,
                busy_timeout: config.busy_timeout,
            },
        )?;
        let store = Self::with_pool(pool)?.with_position_policy(config.position_policy);
        tracing::info!(
            db_path = %config.db_path().display(),
            pool_size = config.pool_size,
            position_policy = config.position_policy.as_str(),
            "block store opened"
        );
        Ok(store)
    }
}

impl SqliteStore<MemoryPool> {
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_pool(MemoryPool::open()?)
    }
}

impl<P: ConnectionPool> SqliteStore<P> {
    /// Wraps an existing pool. The schema is installed (idempotently) on one of its
    /// connections before the store is returned.
    pub fn with_pool(pool: P) -> Result<Self, StoreError> {
        {
            let conn = pool.acquire()?;
            migrate_sqlite_schema(&conn)?;
        }
        Ok(Self {
            pool,
            files: Arc::new(NoFileStore),
            position_policy: PositionPolicy::default(),
        })
    }

    pub fn with_file_store(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = files;
        self
    }

    pub fn with_position_policy(mut self, position_policy: PositionPolicy) -> Self {
        self.position_policy = position_policy;
        self
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn position_policy(&self) -> PositionPolicy {
        self.position_policy
    }

    fn file_store(&self) -> &dyn FileStore {
        self.files.as_ref()
    }

    /// Runs `op` in one `IMMEDIATE` transaction and commits on success. Returning an error
    /// drops the transaction, which rolls it back.
    fn write<T>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.pool.acquire()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Runs `op` against a single read snapshot.
    fn read<T>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.pool.acquire()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let value = op(&tx)?;
        tx.finish()?;
        Ok(value)
    }
}
