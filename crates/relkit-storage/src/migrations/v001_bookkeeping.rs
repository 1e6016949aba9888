//! v001: provisioned entity type registry.

pub const MIGRATION_SQL: &str = "
    CREATE TABLE IF NOT EXISTS relkit_entity_types (
        name            TEXT PRIMARY KEY,
        ddl_hash        TEXT NOT NULL,
        provisioned_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    );
";
