//! Translate `Filter`s into SQL WHERE clauses and run filtered reads.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;

use relkit_core::entity::{Condition, Entity, Filter};
use relkit_core::errors::{RelkitError, RelkitResult, SchemaError};
use relkit_core::schema::{EntityType, Field};

use super::codec;
use crate::{map_sqlite_err, quote};

/// A WHERE clause and its bound parameters.
pub struct WhereClause {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Build the WHERE clause for `filter` against `entity_type`.
pub fn build_where(entity_type: &EntityType, filter: &Filter) -> RelkitResult<WhereClause> {
    let mut parts = Vec::with_capacity(filter.conditions.len());
    let mut params = Vec::new();

    for condition in &filter.conditions {
        let field = resolve_column_field(entity_type, condition.field())?;
        let column = quote(&field.column_name().unwrap_or_default());
        let part = match condition {
            Condition::Exact(_, Value::Null) | Condition::IsNull(_) => format!("{column} IS NULL"),
            Condition::Exact(_, value) => {
                params.push(codec::to_sql(field, value)?);
                format!("{column} = ?")
            }
            Condition::In(_, values) if values.is_empty() => "0".to_string(),
            Condition::In(_, values) => {
                for value in values {
                    params.push(codec::to_sql(field, value)?);
                }
                format!("{column} IN ({})", vec!["?"; values.len()].join(", "))
            }
            Condition::Overlap(_, values) => {
                if !field.is_array() {
                    return Err(RelkitError::ValidationError {
                        reason: format!("overlap lookup on non-array field '{}'", field.name),
                    });
                }
                if values.is_empty() {
                    "0".to_string()
                } else {
                    params.push(SqlValue::Text(serde_json::to_string(values)?));
                    format!(
                        "EXISTS (SELECT 1 FROM json_each({column}) AS a \
                         WHERE a.value IN (SELECT value FROM json_each(?)))"
                    )
                }
            }
        };
        parts.push(part);
    }

    let sql = match (parts.is_empty(), filter.any) {
        (true, false) => "1".to_string(),
        (true, true) => "0".to_string(),
        (false, false) => parts.join(" AND "),
        (false, true) => parts
            .iter()
            .map(|p| format!("({p})"))
            .collect::<Vec<_>>()
            .join(" OR "),
    };
    Ok(WhereClause { sql, params })
}

/// Resolve a lookup name to a field stored on this table.
pub fn resolve_column_field<'a>(
    entity_type: &'a EntityType,
    name: &str,
) -> RelkitResult<&'a Field> {
    entity_type
        .field_by_attname(name)
        .filter(|f| f.column_name().is_some())
        .ok_or_else(|| {
            SchemaError::UnknownField {
                entity_type: entity_type.name.clone(),
                field: name.to_string(),
            }
            .into()
        })
}

/// Column list used by every entity SELECT, pk first.
pub fn select_columns(entity_type: &EntityType) -> (Vec<&Field>, String) {
    let fields: Vec<&Field> = entity_type
        .fields
        .iter()
        .filter(|f| f.primary_key)
        .chain(entity_type.stored_fields())
        .collect();
    let cols = fields
        .iter()
        .filter_map(|f| f.column_name())
        .map(|c| quote(&c))
        .collect::<Vec<_>>()
        .join(", ");
    (fields, cols)
}

/// Decode one SELECT row produced with `select_columns`.
pub fn decode_row(
    entity_type: &EntityType,
    fields: &[&Field],
    row: &rusqlite::Row<'_>,
) -> RelkitResult<Entity> {
    let pk: i64 = row.get(0).map_err(map_sqlite_err)?;
    let mut entity = Entity::new(entity_type.name.clone(), pk, Default::default());
    for (i, field) in fields.iter().enumerate().skip(1) {
        let raw = row.get_ref(i).map_err(map_sqlite_err)?;
        entity.set(&field.name, codec::from_sql(field, raw)?);
    }
    Ok(entity)
}

/// All entities matching `filter`, ordered by pk.
pub fn select(
    conn: &Connection,
    entity_type: &EntityType,
    filter: &Filter,
) -> RelkitResult<Vec<Entity>> {
    let clause = build_where(entity_type, filter)?;
    let (fields, cols) = select_columns(entity_type);
    let sql = format!(
        "SELECT {cols} FROM {} WHERE {} ORDER BY id",
        quote(entity_type.table_name()),
        clause.sql
    );
    let mut stmt = conn.prepare(&sql).map_err(map_sqlite_err)?;
    let mut rows = stmt
        .query(params_from_iter(clause.params.iter()))
        .map_err(map_sqlite_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(map_sqlite_err)? {
        out.push(decode_row(entity_type, &fields, row)?);
    }
    Ok(out)
}

pub fn count(conn: &Connection, entity_type: &EntityType, filter: &Filter) -> RelkitResult<usize> {
    let clause = build_where(entity_type, filter)?;
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        quote(entity_type.table_name()),
        clause.sql
    );
    let n: i64 = conn
        .query_row(&sql, params_from_iter(clause.params.iter()), |row| row.get(0))
        .map_err(map_sqlite_err)?;
    Ok(n as usize)
}

pub fn pks(conn: &Connection, entity_type: &EntityType, filter: &Filter) -> RelkitResult<Vec<i64>> {
    let clause = build_where(entity_type, filter)?;
    let sql = format!(
        "SELECT id FROM {} WHERE {} ORDER BY id",
        quote(entity_type.table_name()),
        clause.sql
    );
    let mut stmt = conn.prepare(&sql).map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map(params_from_iter(clause.params.iter()), |row| row.get(0))
        .map_err(map_sqlite_err)?;
    rows.collect::<Result<Vec<i64>, _>>().map_err(map_sqlite_err)
}
