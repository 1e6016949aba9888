//! FTS5 full-text search over an ad-hoc document per entity.
//!
//! Candidates are loaded into a temp FTS5 table keyed by pk, matched, and
//! ranked by bm25 (higher score = better match).

use std::collections::HashMap;

use rusqlite::{params, Connection};

use relkit_core::entity::{Entity, Filter};
use relkit_core::errors::RelkitResult;
use relkit_core::schema::EntityType;

use super::{codec, filter};
use crate::map_sqlite_err;
use crate::transaction::scoped;

const SCRATCH_TABLE: &str = "relkit_fts_scratch";

/// Text document for an entity: the listed fields joined by a space.
pub fn document(entity: &Entity, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| codec::value_text(&entity.get(f)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Match `query` (FTS5 syntax) against candidates selected by `candidates`.
pub fn search(
    conn: &Connection,
    entity_type: &EntityType,
    fields: &[&str],
    query: &str,
    candidates: &Filter,
    limit: usize,
) -> RelkitResult<Vec<(Entity, f64)>> {
    for name in fields {
        filter::resolve_column_field(entity_type, name)?;
    }
    let entities = filter::select(conn, entity_type, candidates)?;
    if entities.is_empty() || query.trim().is_empty() {
        return Ok(Vec::new());
    }

    scoped(conn, |conn| {
        conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS temp.{SCRATCH_TABLE} USING fts5(body);
             DELETE FROM temp.{SCRATCH_TABLE};"
        ))
        .map_err(map_sqlite_err)?;

        {
            let mut insert = conn
                .prepare(&format!(
                    "INSERT INTO temp.{SCRATCH_TABLE} (rowid, body) VALUES (?1, ?2)"
                ))
                .map_err(map_sqlite_err)?;
            for entity in &entities {
                insert
                    .execute(params![entity.pk, document(entity, fields)])
                    .map_err(map_sqlite_err)?;
            }
        }

        let mut stmt = conn
            .prepare(&format!(
                "SELECT rowid, bm25({SCRATCH_TABLE}) FROM temp.{SCRATCH_TABLE} \
                 WHERE {SCRATCH_TABLE} MATCH ?1 ORDER BY bm25({SCRATCH_TABLE}), rowid LIMIT ?2"
            ))
            .map_err(map_sqlite_err)?;
        let ranked = stmt
            .query_map(params![query, limit as i64], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
            })
            .map_err(map_sqlite_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sqlite_err)?;

        conn.execute_batch(&format!("DELETE FROM temp.{SCRATCH_TABLE};"))
            .map_err(map_sqlite_err)?;

        let mut by_pk: HashMap<i64, Entity> = entities.into_iter().map(|e| (e.pk, e)).collect();
        Ok(ranked
            .into_iter()
            .filter_map(|(pk, bm25)| by_pk.remove(&pk).map(|e| (e, -bm25)))
            .collect())
    })
}
