//! Single connection behind `std::sync::Mutex`.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use relkit_core::config::StorageConfig;
use relkit_core::errors::RelkitResult;

use super::pragmas::{apply_pragmas, verify_wal_mode};
use crate::to_storage_err;

/// A single connection protected by a mutex. The lock is held for one
/// closure call, never across a whole `atomic` block.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    /// Open a new connection to the given database path.
    pub fn open(path: &Path, config: &StorageConfig) -> RelkitResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, config, true)?;
        if config.wal_mode && !verify_wal_mode(&conn)? {
            tracing::warn!(
                path = %path.display(),
                "WAL journal mode was requested but is not active"
            );
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory(config: &StorageConfig) -> RelkitResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, config, false)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the lock and execute a closure with the connection.
    pub fn with_conn_sync<F, T>(&self, f: F) -> RelkitResult<T>
    where
        F: FnOnce(&Connection) -> RelkitResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_storage_err(format!("connection lock poisoned: {e}")))?;
        f(&guard)
    }
}
