//! Chunked iteration, random sampling, and chunked bulk mutation.
//!
//! Each operation snapshots the matching pks up front, then works through
//! them `size` at a time so no single query touches the whole selection.

use std::collections::VecDeque;

use rand::seq::SliceRandom;

use relkit_core::entity::{Entity, Filter, Values};
use relkit_core::errors::{RelkitError, RelkitResult};
use relkit_core::traits::IEntityStorage;
use relkit_observability::{chunk_span, events};

use crate::queryset::QuerySet;

/// Iterator over a selection, loading one chunk of entities per query.
///
/// Entities deleted after the pk snapshot are skipped.
pub struct ChunkIter<'a, S> {
    storage: &'a S,
    entity_type: String,
    chunks: std::vec::IntoIter<Vec<i64>>,
    buffer: VecDeque<Entity>,
}

impl<S: IEntityStorage> Iterator for ChunkIter<'_, S> {
    type Item = RelkitResult<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.is_empty() {
            let chunk = self.chunks.next()?;
            match self.storage.filter(&self.entity_type, &Filter::pk_in(&chunk)) {
                Ok(entities) => {
                    events::chunk_processed(&self.entity_type, "read", entities.len());
                    self.buffer.extend(entities);
                }
                Err(e) => return Some(Err(e)),
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

/// Iterate `queryset` in chunks of `size`. With `randomize`, chunks are drawn
/// from a shuffled pk order.
pub fn chunk<'a, S: IEntityStorage>(
    queryset: &QuerySet<'a, S>,
    size: usize,
    randomize: bool,
) -> RelkitResult<ChunkIter<'a, S>> {
    let size = check_size(size)?;
    let mut pks = queryset.pks()?;
    if randomize {
        pks.shuffle(&mut rand::rng());
    }
    Ok(ChunkIter {
        storage: queryset.storage(),
        entity_type: queryset.entity_type().to_string(),
        chunks: split(&pks, size).into_iter(),
        buffer: VecDeque::new(),
    })
}

/// Up to `size` entities drawn uniformly from `queryset`, ordered by pk.
pub fn sample<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    size: usize,
) -> RelkitResult<Vec<Entity>> {
    let mut pks = queryset.pks()?;
    pks.shuffle(&mut rand::rng());
    pks.truncate(size);
    queryset
        .storage()
        .filter(queryset.entity_type(), &Filter::pk_in(&pks))
}

/// Assign `values` to every entity in `queryset`, `size` rows per statement.
/// Returns rows changed.
pub fn chunk_update<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    size: usize,
    values: &Values,
) -> RelkitResult<usize> {
    let size = check_size(size)?;
    let span = chunk_span!(queryset.entity_type(), "update", size);
    let _guard = span.enter();

    let mut total = 0;
    for chunk in split(&queryset.pks()?, size) {
        let rows = queryset
            .storage()
            .update_where(queryset.entity_type(), &Filter::pk_in(&chunk), values)?;
        events::chunk_processed(queryset.entity_type(), "update", rows);
        total += rows;
    }
    Ok(total)
}

/// Delete every entity in `queryset`, `size` rows per statement. Returns
/// rows deleted from this type; cascades are not counted.
pub fn chunk_delete<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    size: usize,
) -> RelkitResult<usize> {
    let size = check_size(size)?;
    let span = chunk_span!(queryset.entity_type(), "delete", size);
    let _guard = span.enter();

    let mut total = 0;
    for chunk in split(&queryset.pks()?, size) {
        let rows = queryset
            .storage()
            .delete_where(queryset.entity_type(), &Filter::pk_in(&chunk))?;
        events::chunk_processed(queryset.entity_type(), "delete", rows);
        total += rows;
    }
    Ok(total)
}

fn split(pks: &[i64], size: usize) -> Vec<Vec<i64>> {
    pks.chunks(size).map(<[i64]>::to_vec).collect()
}

fn check_size(size: usize) -> RelkitResult<usize> {
    if size == 0 {
        return Err(RelkitError::ValidationError {
            reason: "chunk size must be at least 1".to_string(),
        });
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_order_and_remainder() {
        let chunks = split(&[1, 2, 3, 4, 5], 2);
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn split_of_nothing_is_empty() {
        assert!(split(&[], 3).is_empty());
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(check_size(0).is_err());
        assert_eq!(check_size(7).unwrap(), 7);
    }
}
