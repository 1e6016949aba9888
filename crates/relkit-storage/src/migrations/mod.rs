//! Migration runner. Bookkeeping tables are versioned via `user_version`;
//! entity tables are provisioned from the registry on every open.

pub mod provision;
mod v001_bookkeeping;

use rusqlite::Connection;

use relkit_core::errors::{RelkitResult, StorageError};
use relkit_core::schema::SchemaRegistry;

const MIGRATIONS: &[(&str, u32)] = &[(v001_bookkeeping::MIGRATION_SQL, 1)];

/// Run pending bookkeeping migrations, then provision entity tables.
pub fn run_migrations(conn: &Connection, schema: &SchemaRegistry) -> RelkitResult<()> {
    let current_version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::MigrationFailed {
            version: 0,
            reason: e.to_string(),
        })?;

    for (sql, version) in MIGRATIONS {
        if current_version < *version {
            conn.execute_batch(sql)
                .map_err(|e| StorageError::MigrationFailed {
                    version: *version,
                    reason: e.to_string(),
                })?;
            conn.pragma_update(None, "user_version", version)
                .map_err(|e| StorageError::MigrationFailed {
                    version: *version,
                    reason: e.to_string(),
                })?;
            tracing::debug!(version = version, "applied bookkeeping migration");
        }
    }

    provision::provision_schema(conn, schema)
}
