//! Savepoint-based transactions. Savepoints nest, so `atomic` blocks can be
//! entered from inside one another; the outermost release commits.

use std::sync::atomic::{AtomicUsize, Ordering};

use rusqlite::Connection;

use relkit_core::errors::{RelkitError, RelkitResult, StorageError};

use crate::map_sqlite_err;

/// Tracks the depth of open `atomic` savepoints on one connection.
#[derive(Debug, Default)]
pub struct SavepointStack {
    depth: AtomicUsize,
}

impl SavepointStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Open a new savepoint and return its name.
    pub fn begin(&self, conn: &Connection) -> RelkitResult<String> {
        let depth = self.depth.load(Ordering::SeqCst);
        let name = format!("relkit_atomic_{depth}");
        conn.execute_batch(&format!("SAVEPOINT {name}"))
            .map_err(|e| tx_err(format!("begin {name}: {e}")))?;
        self.depth.fetch_add(1, Ordering::SeqCst);
        Ok(name)
    }

    /// Release a savepoint. If the release fails (deferred constraint
    /// checks run when the outermost savepoint commits) it is rolled back.
    pub fn release(&self, conn: &Connection, name: &str) -> RelkitResult<()> {
        self.depth.fetch_sub(1, Ordering::SeqCst);
        if let Err(e) = conn.execute_batch(&format!("RELEASE {name}")) {
            let _ = conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"));
            return Err(map_sqlite_err(e));
        }
        Ok(())
    }

    /// Undo everything since the savepoint was opened, then drop it.
    pub fn rollback(&self, conn: &Connection, name: &str) -> RelkitResult<()> {
        self.depth.fetch_sub(1, Ordering::SeqCst);
        conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"))
            .map_err(|e| tx_err(format!("rollback {name}: {e}")))
    }
}

/// Run a multi-statement query as one unit on an already-locked connection.
pub fn scoped<T, F>(conn: &Connection, f: F) -> RelkitResult<T>
where
    F: FnOnce(&Connection) -> RelkitResult<T>,
{
    conn.execute_batch("SAVEPOINT relkit_op")
        .map_err(|e| tx_err(format!("begin relkit_op: {e}")))?;
    match f(conn) {
        Ok(value) => {
            if let Err(e) = conn.execute_batch("RELEASE relkit_op") {
                let _ = conn.execute_batch("ROLLBACK TO relkit_op; RELEASE relkit_op");
                return Err(map_sqlite_err(e));
            }
            Ok(value)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK TO relkit_op; RELEASE relkit_op");
            Err(e)
        }
    }
}

fn tx_err(reason: String) -> RelkitError {
    StorageError::TransactionFailed { reason }.into()
}
