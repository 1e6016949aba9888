//! Connection ownership. SQLite writes are serialized through one connection.

pub mod pragmas;
pub mod write_connection;

use std::path::{Path, PathBuf};

use relkit_core::config::StorageConfig;
use relkit_core::errors::RelkitResult;

pub use write_connection::WriteConnection;

/// Owns the single connection used for every read and write.
pub struct ConnectionPool {
    pub writer: WriteConnection,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    /// Open a pool for the given database file.
    pub fn open(path: &Path, config: &StorageConfig) -> RelkitResult<Self> {
        Ok(Self {
            writer: WriteConnection::open(path, config)?,
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory pool (for testing).
    pub fn open_in_memory(config: &StorageConfig) -> RelkitResult<Self> {
        Ok(Self {
            writer: WriteConnection::open_in_memory(config)?,
            db_path: None,
        })
    }
}
