//! PRAGMA configuration applied to every SQLite connection.
//!
//! WAL mode (file-backed only), NORMAL sync, configurable cache and
//! busy_timeout, foreign_keys ON.

use rusqlite::Connection;

use relkit_core::config::StorageConfig;
use relkit_core::errors::RelkitResult;

use crate::to_storage_err;

/// Apply performance and safety pragmas to a connection.
pub fn apply_pragmas(
    conn: &Connection,
    config: &StorageConfig,
    file_backed: bool,
) -> RelkitResult<()> {
    if file_backed && config.wal_mode {
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(|e| to_storage_err(e.to_string()))?;
    }
    conn.execute_batch(&format!(
        "
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = {};
        PRAGMA busy_timeout = {};
        PRAGMA foreign_keys = {};
        ",
        config.cache_size,
        config.busy_timeout_ms,
        if config.foreign_keys { "ON" } else { "OFF" },
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Verify that WAL mode is active on a connection.
pub fn verify_wal_mode(conn: &Connection) -> RelkitResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}

/// Whether foreign key enforcement is on.
pub fn foreign_keys_enabled(conn: &Connection) -> RelkitResult<bool> {
    let on: i64 = conn
        .pragma_query_value(None, "foreign_keys", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(on == 1)
}
