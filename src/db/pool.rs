//! Bounded r2d2 connection pool over the SQLite store.
//!
//! Pool size controls concurrent reader fan-out; write serialization is the
//! storage engine's job (WAL), not the pool's. Acquisition blocks up to the
//! configured timeout and then fails fast — this is the service's only
//! backpressure mechanism.

use crate::error::{MemoryError, Result};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::{Duration, Instant};

pub type PooledConn = r2d2::PooledConnection<SqliteConnectionManager>;

/// Point-in-time pool occupancy, reported by stats and health checks.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: u32,
    pub in_use: u32,
}

pub struct ConnectionPool {
    pool: r2d2::Pool<SqliteConnectionManager>,
    size: u32,
    acquire_timeout: Duration,
}

impl ConnectionPool {
    /// Build a pool of `size` connections against an existing database file.
    ///
    /// All connections are opened eagerly, so first-call latency is paid at
    /// startup rather than on the first request. The schema must already be
    /// initialized (see [`crate::db::open_database`]).
    pub fn open(path: impl AsRef<Path>, size: u32, acquire_timeout: Duration) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref())
            .with_init(|conn| crate::db::apply_pragmas(conn));
        Self::build(manager, size, acquire_timeout)
    }

    /// Pool over a shared-cache in-memory database, for tests. Each caller
    /// should pass a unique `name` to avoid cross-test pollution.
    #[cfg(test)]
    pub fn open_in_memory(name: &str, size: u32, acquire_timeout: Duration) -> Result<Self> {
        let uri = format!("file:{name}?mode=memory&cache=shared");
        let manager =
            SqliteConnectionManager::file(uri).with_init(|conn| {
                conn.pragma_update(None, "foreign_keys", "ON")?;
                Ok(())
            });
        Self::build(manager, size, acquire_timeout)
    }

    fn build(
        manager: SqliteConnectionManager,
        size: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = r2d2::Pool::builder()
            .max_size(size)
            .connection_timeout(acquire_timeout)
            .build(manager)
            .map_err(|e| MemoryError::StorageIntegrity(format!("failed to build pool: {e}")))?;

        tracing::info!(size, "connection pool ready");
        Ok(Self {
            pool,
            size,
            acquire_timeout,
        })
    }

    /// Acquire a connection, blocking up to the configured timeout.
    pub fn acquire(&self) -> Result<PooledConn> {
        self.acquire_within(self.acquire_timeout)
    }

    /// Acquire with an explicit timeout (health checks use a short one).
    pub fn acquire_within(&self, timeout: Duration) -> Result<PooledConn> {
        let started = Instant::now();
        self.pool.get_timeout(timeout).map_err(|_| {
            let waited_ms = started.elapsed().as_millis() as u64;
            tracing::warn!(waited_ms, "connection pool exhausted");
            MemoryError::PoolExhausted { waited_ms }
        })
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.pool.state();
        PoolStatus {
            size: self.size,
            idle: state.idle_connections,
            in_use: state.connections - state.idle_connections,
        }
    }
}
