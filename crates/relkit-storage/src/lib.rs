//! # relkit-storage
//!
//! SQLite persistence gateway. Provisions one table per entity type (plus
//! many-to-many link tables and history tables) from a `SchemaRegistry`,
//! and implements `IEntityStorage` on top of it.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;
pub mod transaction;

pub use engine::StorageEngine;

use relkit_core::errors::{RelkitError, StorageError};

/// Helper to convert a message into a generic storage error.
pub(crate) fn to_storage_err(msg: String) -> RelkitError {
    StorageError::SqliteError { message: msg }.into()
}

/// Classify a rusqlite error, surfacing uniqueness violations distinctly.
pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> RelkitError {
    if let rusqlite::Error::SqliteFailure(err, msg) = &e {
        if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        {
            return StorageError::UniqueViolation {
                message: msg.clone().unwrap_or_else(|| e.to_string()),
            }
            .into();
        }
    }
    to_storage_err(e.to_string())
}

/// Double-quote an identifier. Names are validated by the registry.
pub(crate) fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}
