//! Insert, update, get, delete, and bulk ops for entities.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;

use relkit_core::entity::{Entity, Filter, HistoryChange, Values, PK_FIELD};
use relkit_core::errors::{RelkitError, RelkitResult, SchemaError};
use relkit_core::schema::{EntityType, SchemaRegistry};

use super::{codec, filter, history_ops};
use crate::transaction::scoped;
use crate::{map_sqlite_err, quote};

/// Fetch one entity by pk.
pub fn get_entity(
    conn: &Connection,
    entity_type: &EntityType,
    pk: i64,
) -> RelkitResult<Option<Entity>> {
    Ok(filter::select(conn, entity_type, &Filter::exact(PK_FIELD, pk))?
        .into_iter()
        .next())
}

/// Insert a row and return it as stored. `values` keys may be field names
/// or `<relation>_id` attribute names; an explicit `id` is honoured.
pub fn insert_entity(
    conn: &Connection,
    entity_type: &EntityType,
    values: &Values,
) -> RelkitResult<Entity> {
    scoped(conn, |conn| {
        let mut columns = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();
        for (key, value) in values {
            let field = writable_field(entity_type, key)?;
            columns.push(quote(&field.column_name().unwrap_or_default()));
            params.push(codec::to_sql(field, value)?);
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote(entity_type.table_name()))
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote(entity_type.table_name()),
                columns.join(", "),
                vec!["?"; columns.len()].join(", ")
            )
        };
        conn.execute(&sql, params_from_iter(params.iter()))
            .map_err(map_sqlite_err)?;

        let pk = conn.last_insert_rowid();
        let entity = get_entity(conn, entity_type, pk)?.ok_or_else(|| not_found(entity_type, pk))?;
        if entity_type.history {
            history_ops::record(conn, entity_type, &entity, HistoryChange::Created)?;
        }
        Ok(entity)
    })
}

/// Write every stored field of `entity`. Missing keys are written as NULL.
pub fn update_entity(
    conn: &Connection,
    entity_type: &EntityType,
    entity: &Entity,
) -> RelkitResult<()> {
    scoped(conn, |conn| {
        let mut assignments = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();
        for field in entity_type.stored_fields() {
            let value = entity.values.get(&field.name).unwrap_or(&Value::Null);
            assignments.push(format!("{} = ?", quote(&field.column_name().unwrap_or_default())));
            params.push(codec::to_sql(field, value)?);
        }
        if assignments.is_empty() {
            return ensure_exists(conn, entity_type, entity.pk);
        }
        params.push(SqlValue::Integer(entity.pk));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            quote(entity_type.table_name()),
            assignments.join(", ")
        );
        let rows = conn
            .execute(&sql, params_from_iter(params.iter()))
            .map_err(map_sqlite_err)?;
        if rows == 0 {
            return Err(not_found(entity_type, entity.pk));
        }
        if entity_type.history {
            history_ops::record(conn, entity_type, entity, HistoryChange::Updated)?;
        }
        Ok(())
    })
}

/// Delete one entity. Generic reverse relations are deleted first; SQLite
/// applies `ON DELETE` actions for concrete foreign keys.
pub fn delete_entity(
    conn: &Connection,
    schema: &SchemaRegistry,
    entity_type: &EntityType,
    pk: i64,
) -> RelkitResult<()> {
    scoped(conn, |conn| {
        let current = get_entity(conn, entity_type, pk)?.ok_or_else(|| not_found(entity_type, pk))?;

        for field in entity_type.fields.iter().filter(|f| f.is_generic()) {
            let (Some(rel), Some(owner)) = (&field.relation, field.related_type()) else {
                continue;
            };
            let Some(link) = &rel.generic else { continue };
            let owner_type = schema.entity_type(owner)?;
            let generic_filter = Filter::exact(link.type_field.clone(), entity_type.name.clone())
                .with(relkit_core::Condition::Exact(link.id_field.clone(), Value::from(pk)));
            delete_where(conn, schema, owner_type, &generic_filter)?;
        }

        if entity_type.history {
            history_ops::record(conn, entity_type, &current, HistoryChange::Deleted)?;
        }
        let rows = conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", quote(entity_type.table_name())),
                [pk],
            )
            .map_err(map_sqlite_err)?;
        if rows == 0 {
            return Err(not_found(entity_type, pk));
        }
        Ok(())
    })
}

/// Assign `values` on every matching row. Returns rows changed.
pub fn update_where(
    conn: &Connection,
    entity_type: &EntityType,
    filter: &Filter,
    values: &Values,
) -> RelkitResult<usize> {
    scoped(conn, |conn| {
        let pks = filter::pks(conn, entity_type, filter)?;
        if pks.is_empty() || values.is_empty() {
            return Ok(0);
        }
        let mut assignments = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();
        for (key, value) in values {
            let field = writable_field(entity_type, key)?;
            assignments.push(format!("{} = ?", quote(&field.column_name().unwrap_or_default())));
            params.push(codec::to_sql(field, value)?);
        }
        params.extend(pks.iter().map(|pk| SqlValue::Integer(*pk)));
        let sql = format!(
            "UPDATE {} SET {} WHERE id IN ({})",
            quote(entity_type.table_name()),
            assignments.join(", "),
            vec!["?"; pks.len()].join(", ")
        );
        let rows = conn
            .execute(&sql, params_from_iter(params.iter()))
            .map_err(map_sqlite_err)?;

        if entity_type.history {
            for entity in filter::select(conn, entity_type, &Filter::pk_in(&pks))? {
                history_ops::record(conn, entity_type, &entity, HistoryChange::Updated)?;
            }
        }
        Ok(rows)
    })
}

/// Delete every matching row. Returns rows deleted (cascades not counted).
pub fn delete_where(
    conn: &Connection,
    schema: &SchemaRegistry,
    entity_type: &EntityType,
    filter: &Filter,
) -> RelkitResult<usize> {
    scoped(conn, |conn| {
        let pks = filter::pks(conn, entity_type, filter)?;
        let mut deleted = 0;
        for pk in pks {
            // An earlier delete in this loop may already have cascaded here.
            if get_entity(conn, entity_type, pk)?.is_some() {
                delete_entity(conn, schema, entity_type, pk)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    })
}

fn writable_field<'a>(
    entity_type: &'a EntityType,
    key: &str,
) -> RelkitResult<&'a relkit_core::Field> {
    let field = entity_type
        .field_by_attname(key)
        .ok_or_else(|| SchemaError::UnknownField {
            entity_type: entity_type.name.clone(),
            field: key.to_string(),
        })?;
    if field.column_name().is_none() {
        return Err(RelkitError::ValidationError {
            reason: format!(
                "'{}' on {} is not stored on this table and cannot be assigned directly",
                key, entity_type.name
            ),
        });
    }
    Ok(field)
}

fn ensure_exists(conn: &Connection, entity_type: &EntityType, pk: i64) -> RelkitResult<()> {
    match get_entity(conn, entity_type, pk)? {
        Some(_) => Ok(()),
        None => Err(not_found(entity_type, pk)),
    }
}

fn not_found(entity_type: &EntityType, pk: i64) -> RelkitError {
    RelkitError::EntityNotFound {
        entity_type: entity_type.name.clone(),
        pk,
    }
}
