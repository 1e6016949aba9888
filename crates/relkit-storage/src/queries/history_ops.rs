//! History rows for history-enabled types: record, list, re-point.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use relkit_core::entity::{Entity, HistoryChange, HistoryRecord, Values};
use relkit_core::errors::RelkitResult;
use relkit_core::schema::EntityType;

use crate::{map_sqlite_err, quote, to_storage_err};

/// Append a snapshot of `entity`.
pub fn record(
    conn: &Connection,
    entity_type: &EntityType,
    entity: &Entity,
    change: HistoryChange,
) -> RelkitResult<()> {
    let snapshot = serde_json::to_string(&entity.values)?;
    conn.execute(
        &format!(
            "INSERT INTO {} (id, history_type, snapshot, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            quote(&entity_type.history_table())
        ),
        params![entity.pk, change.as_str(), snapshot, Utc::now().to_rfc3339()],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

/// All history rows of one pk, oldest first.
pub fn list(
    conn: &Connection,
    entity_type: &EntityType,
    pk: i64,
) -> RelkitResult<Vec<HistoryRecord>> {
    if !entity_type.history {
        return Ok(Vec::new());
    }
    let mut stmt = conn
        .prepare(&format!(
            "SELECT history_id, id, history_type, snapshot, recorded_at FROM {} \
             WHERE id = ?1 ORDER BY history_id",
            quote(&entity_type.history_table())
        ))
        .map_err(map_sqlite_err)?;
    let rows = stmt
        .query_map([pk], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(map_sqlite_err)?;

    let mut out = Vec::new();
    for row in rows {
        let (history_id, pk, kind, snapshot, recorded_at) = row.map_err(map_sqlite_err)?;
        let change = HistoryChange::parse(&kind)
            .ok_or_else(|| to_storage_err(format!("unknown history type '{kind}'")))?;
        let values: Values = serde_json::from_str(&snapshot)?;
        let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
            .map_err(|e| to_storage_err(e.to_string()))?
            .with_timezone(&Utc);
        out.push(HistoryRecord {
            history_id,
            pk,
            change,
            values,
            recorded_at,
        });
    }
    Ok(out)
}

/// Re-point every history row of `from_pk` to `to_pk`.
pub fn rewrite(
    conn: &Connection,
    entity_type: &EntityType,
    from_pk: i64,
    to_pk: i64,
) -> RelkitResult<usize> {
    if !entity_type.history {
        return Ok(0);
    }
    conn.execute(
        &format!("UPDATE {} SET id = ?1 WHERE id = ?2", quote(&entity_type.history_table())),
        params![to_pk, from_pk],
    )
    .map_err(map_sqlite_err)
}
