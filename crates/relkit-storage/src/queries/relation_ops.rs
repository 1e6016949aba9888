//! Relation traversal and many-to-many link maintenance.

use rusqlite::{params, Connection};
use serde_json::Value;

use relkit_core::entity::{Condition, Entity, Filter};
use relkit_core::errors::{RelkitError, RelkitResult};
use relkit_core::schema::{Cardinality, Field, SchemaRegistry};

use super::{entity_crud, filter};
use crate::transaction::scoped;
use crate::{map_sqlite_err, quote};

/// Entities reachable from `entity` through `field_name`.
pub fn related(
    conn: &Connection,
    schema: &SchemaRegistry,
    entity: &Entity,
    field_name: &str,
) -> RelkitResult<Vec<Entity>> {
    let field = schema.field(&entity.entity_type, field_name)?;
    let rel = field.relation.as_ref().ok_or_else(|| not_a_relation(field))?;
    let related_type = schema.entity_type(&rel.related_type)?;

    if let Some(link) = &rel.generic {
        let generic_filter = Filter::and(vec![
            Condition::Exact(link.type_field.clone(), Value::from(entity.entity_type.clone())),
            Condition::Exact(link.id_field.clone(), Value::from(entity.pk)),
        ]);
        return filter::select(conn, related_type, &generic_filter);
    }

    match (rel.cardinality, rel.concrete) {
        (Cardinality::ManyToMany, _) => {
            let pks = link_pks(conn, field, entity.pk)?;
            filter::select(conn, related_type, &Filter::pk_in(&pks))
        }
        (_, true) => match entity.related_pk(&field.name) {
            Some(pk) => Ok(entity_crud::get_entity(conn, related_type, pk)?
                .into_iter()
                .collect()),
            None => Ok(Vec::new()),
        },
        (_, false) => filter::select(
            conn,
            related_type,
            &Filter::exact(rel.remote_field.clone(), entity.pk),
        ),
    }
}

/// Far-side pks linked to `pk` through a many-to-many field.
pub fn link_pks(conn: &Connection, field: &Field, pk: i64) -> RelkitResult<Vec<i64>> {
    let (through, near, far) = link_columns(field)?;
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {far} FROM {} WHERE {near} = ?1 ORDER BY id",
            quote(through)
        ))
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map([pk], |row| row.get(0))
        .map_err(map_sqlite_err)?;
    rows.collect::<Result<Vec<i64>, _>>().map_err(map_sqlite_err)
}

/// Replace the link set of a many-to-many field with `pks` (duplicates ignored).
pub fn set_many_to_many(
    conn: &Connection,
    field: &Field,
    pk: i64,
    pks: &[i64],
) -> RelkitResult<()> {
    let (through, near, far) = link_columns(field)?;
    scoped(conn, |conn| {
        conn.execute(
            &format!("DELETE FROM {} WHERE {near} = ?1", quote(through)),
            [pk],
        )
        .map_err(map_sqlite_err)?;
        let sql = format!(
            "INSERT OR IGNORE INTO {} ({near}, {far}) VALUES (?1, ?2)",
            quote(through)
        );
        for other in pks {
            conn.execute(&sql, params![pk, other]).map_err(map_sqlite_err)?;
        }
        Ok(())
    })
}

/// (through table, column for this side, column for the far side).
fn link_columns(field: &Field) -> RelkitResult<(&str, &'static str, &'static str)> {
    let rel = field.relation.as_ref().ok_or_else(|| not_a_relation(field))?;
    let through = rel.through.as_deref().ok_or_else(|| not_a_relation(field))?;
    Ok(if rel.concrete {
        (through, "source_id", "target_id")
    } else {
        (through, "target_id", "source_id")
    })
}

fn not_a_relation(field: &Field) -> RelkitError {
    RelkitError::ValidationError {
        reason: format!(
            "'{}' on {} is not a relation of the expected kind",
            field.name, field.owner
        ),
    }
}
