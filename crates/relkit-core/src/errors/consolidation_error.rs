use crate::entity::EntityRef;

/// Merge-engine errors.
///
/// `AmbiguousConsolidation` and `ConsolidationCascade` are raised before the
/// offending pair is mutated. The rest are plain failures.
#[derive(Debug, thiserror::Error)]
pub enum ConsolidationError {
    #[error(
        "ambiguous consolidation of {merge_source} into {merge_target}: '{relation}' differs \
         ({} vs {}) and neither side is queued for merging (requested: {requested_source} into {requested_target})",
        display_ref(.source_value),
        display_ref(.target_value)
    )]
    AmbiguousConsolidation {
        merge_source: EntityRef,
        merge_target: EntityRef,
        requested_source: EntityRef,
        requested_target: EntityRef,
        relation: String,
        source_value: Option<EntityRef>,
        target_value: Option<EntityRef>,
    },

    #[error(
        "merge requires consolidating {} additional pair(s): {}",
        .additional_pairs.len(),
        display_pairs(.additional_pairs)
    )]
    ConsolidationCascade {
        additional_pairs: Vec<(EntityRef, EntityRef)>,
    },

    #[error("entity not found for merge: {entity}")]
    MissingEntity { entity: EntityRef },

    #[error("cannot merge {source_type} into {target_type}: types differ")]
    TypeMismatch {
        source_type: String,
        target_type: String,
    },

    #[error("deferred update could not resolve {entity}")]
    UnresolvedDeferredUpdate { entity: EntityRef },

    #[error("conflict discovery exceeded max depth {max_depth}")]
    DepthExceeded { max_depth: usize },
}

fn display_ref(value: &Option<EntityRef>) -> String {
    match value {
        Some(r) => r.to_string(),
        None => "null".to_string(),
    }
}

fn display_pairs(pairs: &[(EntityRef, EntityRef)]) -> String {
    pairs
        .iter()
        .map(|(s, t)| format!("{s} -> {t}"))
        .collect::<Vec<_>>()
        .join(", ")
}
