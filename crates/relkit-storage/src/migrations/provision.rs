//! DDL generation from the schema registry.
//!
//! One table per entity type, `UNIQUE` indexes for unique fields and
//! `unique_together` groups, deferred foreign keys with the declared
//! `ON DELETE` action, link tables for many-to-many relations, and a
//! `<type>__history` table for history-enabled types.

use rusqlite::{params, Connection, OptionalExtension};

use relkit_core::errors::{RelkitResult, StorageError};
use relkit_core::schema::{EntityType, Field, OnDelete, SchemaRegistry, ValueKind};

use crate::quote;

/// Create every missing table and index. Existing tables are left alone; a
/// changed definition is logged, not migrated.
pub fn provision_schema(conn: &Connection, schema: &SchemaRegistry) -> RelkitResult<()> {
    for entity_type in schema.types() {
        let ddl = entity_type_ddl(entity_type);
        let hash = blake3::hash(ddl.as_bytes()).to_hex().to_string();

        let existing: Option<String> = conn
            .query_row(
                "SELECT ddl_hash FROM relkit_entity_types WHERE name = ?1",
                params![entity_type.name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| migration_err(e.to_string()))?;

        match existing {
            Some(old) if old != hash => tracing::warn!(
                entity_type = %entity_type.name,
                "entity type definition changed since the table was provisioned"
            ),
            Some(_) => {}
            None => {
                conn.execute(
                    "INSERT INTO relkit_entity_types (name, ddl_hash) VALUES (?1, ?2)",
                    params![entity_type.name, hash],
                )
                .map_err(|e| migration_err(e.to_string()))?;
            }
        }

        conn.execute_batch(&ddl)
            .map_err(|e| migration_err(format!("{}: {e}", entity_type.name)))?;
    }
    Ok(())
}

/// All DDL statements for one entity type.
pub fn entity_type_ddl(entity_type: &EntityType) -> String {
    let table = entity_type.table_name();
    let mut columns = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote("id"))];
    let mut statements = Vec::new();

    for field in entity_type.stored_fields() {
        let Some(column) = field.column_name() else {
            continue;
        };
        columns.push(column_definition(field, &column));
        if field.is_unique() {
            statements.push(format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {}({});",
                quote(&format!("{table}__{column}__uniq")),
                quote(table),
                quote(&column)
            ));
        } else if field.is_relation() {
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}({});",
                quote(&format!("{table}__{column}__idx")),
                quote(table),
                quote(&column)
            ));
        }
    }

    for (i, group) in entity_type.unique_together.iter().enumerate() {
        let cols: Vec<String> = group
            .iter()
            .filter_map(|name| entity_type.field(name).and_then(Field::column_name))
            .map(|c| quote(&c))
            .collect();
        statements.push(format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {}({});",
            quote(&format!("{table}__together{i}__uniq")),
            quote(table),
            cols.join(", ")
        ));
    }

    for field in entity_type.fields.iter().filter(|f| f.is_concrete()) {
        let Some(rel) = &field.relation else { continue };
        let Some(through) = &rel.through else { continue };
        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {through_q} (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id  INTEGER NOT NULL REFERENCES {owner}(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
                target_id  INTEGER NOT NULL REFERENCES {target}(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
                UNIQUE (source_id, target_id)
            );
            CREATE INDEX IF NOT EXISTS {target_idx} ON {through_q}(target_id);",
            through_q = quote(through),
            owner = quote(table),
            target = quote(&rel.related_type),
            target_idx = quote(&format!("{through}__target__idx")),
        ));
    }

    if entity_type.history {
        let history = entity_type.history_table();
        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {history_q} (
                history_id    INTEGER PRIMARY KEY AUTOINCREMENT,
                id            INTEGER NOT NULL,
                history_type  TEXT NOT NULL,
                snapshot      TEXT NOT NULL,
                recorded_at   TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS {idx} ON {history_q}(id);",
            history_q = quote(&history),
            idx = quote(&format!("{history}__id__idx")),
        ));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);\n{}",
        quote(table),
        columns.join(",\n    "),
        statements.join("\n")
    )
}

fn column_definition(field: &Field, column: &str) -> String {
    match &field.relation {
        Some(rel) => {
            let action = match rel.on_delete {
                OnDelete::Cascade => "CASCADE",
                OnDelete::SetNull => "SET NULL",
            };
            format!(
                "{} INTEGER REFERENCES {}(id) ON DELETE {action} DEFERRABLE INITIALLY DEFERRED",
                quote(column),
                quote(&rel.related_type)
            )
        }
        None => format!("{} {}", quote(column), sql_type(field.value_kind)),
    }
}

fn sql_type(kind: Option<ValueKind>) -> &'static str {
    match kind {
        Some(ValueKind::Integer | ValueKind::Boolean) | None => "INTEGER",
        Some(ValueKind::Real) => "REAL",
        Some(ValueKind::Text | ValueKind::Json | ValueKind::Array) => "TEXT",
    }
}

fn migration_err(reason: String) -> relkit_core::RelkitError {
    StorageError::MigrationFailed { version: 0, reason }.into()
}
