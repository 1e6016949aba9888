//! Structured log events for key operations.
//!
//! Each function emits a `tracing` event with structured fields.

use std::fmt::Display;

/// Log the merge plan produced by discovery.
pub fn merge_plan_built(
    source: &dyn Display,
    target: &dyn Display,
    pairs: usize,
    max_depth: usize,
) {
    tracing::info!(
        event = "merge_plan_built",
        source = %source,
        target = %target,
        pairs = pairs,
        max_depth = max_depth,
        "merge plan built"
    );
}

/// Log a merge refused because it would cascade into further pairs.
pub fn cascade_rejected(source: &dyn Display, target: &dyn Display, additional_pairs: usize) {
    tracing::warn!(
        event = "cascade_rejected",
        source = %source,
        target = %target,
        additional_pairs = additional_pairs,
        "merge rejected: related uniques would need consolidating"
    );
}

/// Log one pair merged by the executor.
pub fn pair_merged(source: &dyn Display, target: &dyn Display, depth: usize) {
    tracing::debug!(
        event = "pair_merged",
        source = %source,
        target = %target,
        depth = depth,
        "pair merged"
    );
}

/// Log the deferred reverse-relation pass.
pub fn deferred_updates_applied(count: usize) {
    tracing::debug!(
        event = "deferred_updates_applied",
        count = count,
        "deferred updates applied"
    );
}

/// Log a completed consolidation.
pub fn merge_completed(source: &dyn Display, target: &dyn Display, pairs: usize) {
    tracing::info!(
        event = "merge_completed",
        source = %source,
        target = %target,
        pairs = pairs,
        "consolidation completed"
    );
}

/// Log the outcome of an upsert.
pub fn entity_upserted(entity: &dyn Display, created: bool) {
    tracing::debug!(
        event = "entity_upserted",
        entity = %entity,
        created = created,
        "entity upserted"
    );
}

/// Log one processed chunk of a bulk operation.
pub fn chunk_processed(entity_type: &str, operation: &str, rows: usize) {
    tracing::debug!(
        event = "chunk_processed",
        entity_type = %entity_type,
        operation = %operation,
        rows = rows,
        "chunk processed"
    );
}

/// Log a write that hit a unique constraint and is retried. `fallback`
/// names the retry: `lookup` for upserts, `delete_source_first` for merges.
pub fn unique_collision_retried(entity_type: &str, fallback: &str, reason: &str) {
    tracing::warn!(
        event = "unique_collision_retried",
        entity_type = %entity_type,
        fallback = %fallback,
        reason = %reason,
        "unique collision, retrying"
    );
}

/// Log a cached value dropped because its timeout passed.
pub fn cache_entry_expired(namespace: &str, key: &str) {
    tracing::debug!(
        event = "cache_entry_expired",
        namespace = %namespace,
        key = %key,
        "cache entry expired"
    );
}

/// Log a full cache clear.
pub fn cache_cleared(namespace: &str, keys: usize) {
    tracing::info!(
        event = "cache_cleared",
        namespace = %namespace,
        keys = keys,
        "cache cleared"
    );
}
