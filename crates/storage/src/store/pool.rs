#![forbid(unsafe_code)]

//! Connection pooling for the block store.
//!
//! Every operation acquires exactly one connection and hands it back when the guard is
//! dropped, so early returns through `?` and unwinding both release it.

use parking_lot::{Condvar, Mutex, MutexGuard};
use rusqlite::{Connection, OpenFlags};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("timed out after {waited_ms}ms waiting for a pooled connection")]
    Timeout { waited_ms: u128 },

    #[error("failed to open connection: {0}")]
    Open(#[source] rusqlite::Error),

    #[error("pool configuration error: {0}")]
    InvalidConfig(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolStatus {
    pub max_size: usize,
    pub open: usize,
    pub idle: usize,
}

impl PoolStatus {
    pub fn in_use(&self) -> usize {
        self.open - self.idle
    }
}

/// Source of exclusive connections. The store never reaches for global state; callers
/// pass the pool in, which lets tests substitute [`MemoryPool`].
pub trait ConnectionPool: Send + Sync {
    type Conn<'a>: DerefMut<Target = Connection>
    where
        Self: 'a;

    fn acquire(&self) -> Result<Self::Conn<'_>, PoolError>;

    fn status(&self) -> PoolStatus;
}

#[derive(Clone, Debug)]
pub struct SqlitePoolOptions {
    pub max_size: usize,
    pub acquire_timeout: Duration,
    pub busy_timeout: Duration,
}

impl Default for SqlitePoolOptions {
    fn default() -> Self {
        Self {
            max_size: 4,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

struct PoolState {
    idle: Vec<Connection>,
    open: usize,
}

/// Bounded pool of connections to one SQLite database file.
///
/// Connections are opened lazily up to `max_size`; once all are checked out, `acquire`
/// waits for a release until `acquire_timeout` elapses.
pub struct SqlitePool {
    db_path: PathBuf,
    options: SqlitePoolOptions,
    state: Mutex<PoolState>,
    released: Condvar,
}

impl std::fmt::Debug for SqlitePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePool")
            .field("db_path", &self.db_path)
            .field("options", &self.options)
            .field("status", &self.status())
            .finish()
    }
}

impl SqlitePool {
    pub fn new(db_path: impl AsRef<Path>, options: SqlitePoolOptions) -> Result<Self, PoolError> {
        if options.max_size == 0 {
            return Err(PoolError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            db_path: db_path.as_ref().to_path_buf(),
            options,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                open: 0,
            }),
            released: Condvar::new(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open_connection(&self) -> Result<Connection, PoolError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(PoolError::Open)?;
        prepare_connection(&conn, self.options.busy_timeout).map_err(PoolError::Open)?;
        tracing::debug!(db_path = %self.db_path.display(), "opened pooled connection");
        Ok(conn)
    }

    fn release(&self, conn: Connection) {
        let mut state = self.state.lock();
        if conn.is_autocommit() {
            state.idle.push(conn);
        } else if conn.execute_batch("ROLLBACK").is_ok() {
            state.idle.push(conn);
        } else {
            tracing::warn!("discarding pooled connection stuck in a transaction");
            state.open -= 1;
        }
        drop(state);
        self.released.notify_one();
    }
}

impl ConnectionPool for SqlitePool {
    type Conn<'a> = PooledConnection<'a>;

    fn acquire(&self) -> Result<PooledConnection<'_>, PoolError> {
        let started = Instant::now();
        let deadline = started + self.options.acquire_timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(conn) = state.idle.pop() {
                return Ok(PooledConnection::new(self, conn));
            }
            if state.open < self.options.max_size {
                state.open += 1;
                drop(state);
                return match self.open_connection() {
                    Ok(conn) => Ok(PooledConnection::new(self, conn)),
                    Err(err) => {
                        self.state.lock().open -= 1;
                        self.released.notify_one();
                        Err(err)
                    }
                };
            }
            let timed_out = self.released.wait_until(&mut state, deadline).timed_out();
            if timed_out && state.idle.is_empty() {
                return Err(PoolError::Timeout {
                    waited_ms: started.elapsed().as_millis(),
                });
            }
        }
    }

    fn status(&self) -> PoolStatus {
        let state = self.state.lock();
        PoolStatus {
            max_size: self.options.max_size,
            open: state.open,
            idle: state.idle.len(),
        }
    }
}

/// A checked-out connection; returned to its pool on drop.
pub struct PooledConnection<'a> {
    pool: &'a SqlitePool,
    conn: Option<Connection>,
}

impl<'a> PooledConnection<'a> {
    fn new(pool: &'a SqlitePool, conn: Connection) -> Self {
        Self {
            pool,
            conn: Some(conn),
        }
    }
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self.conn.as_ref() {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        match self.conn.as_mut() {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

/// Single in-memory connection behind a mutex.
pub struct MemoryPool {
    conn: Mutex<Connection>,
    acquire_timeout: Duration,
}

impl MemoryPool {
    pub fn open() -> Result<Self, PoolError> {
        let conn = Connection::open_in_memory().map_err(PoolError::Open)?;
        prepare_connection(&conn, Duration::from_secs(5)).map_err(PoolError::Open)?;
        Ok(Self {
            conn: Mutex::new(conn),
            acquire_timeout: Duration::from_secs(5),
        })
    }
}

impl ConnectionPool for MemoryPool {
    type Conn<'a> = MutexGuard<'a, Connection>;

    fn acquire(&self) -> Result<MutexGuard<'_, Connection>, PoolError> {
        self.conn
            .try_lock_for(self.acquire_timeout)
            .ok_or(PoolError::Timeout {
                waited_ms: self.acquire_timeout.as_millis(),
            })
    }

    fn status(&self) -> PoolStatus {
        let idle = usize::from(!self.conn.is_locked());
        PoolStatus {
            max_size: 1,
            open: 1,
            idle,
        }
    }
}

fn prepare_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}
