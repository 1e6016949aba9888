//! Span definitions per operation: consolidation, upsert, chunking, search.

/// Span around one `consolidate_objects` call.
#[macro_export]
macro_rules! consolidation_span {
    ($source:expr, $target:expr) => {
        tracing::info_span!("relkit.consolidation", source = %$source, target = %$target)
    };
}

/// Span around one `create_or_update` / `get_if_exists` call.
#[macro_export]
macro_rules! upsert_span {
    ($entity_type:expr) => {
        tracing::info_span!("relkit.upsert", entity_type = %$entity_type)
    };
}

/// Span around one chunked bulk operation.
#[macro_export]
macro_rules! chunk_span {
    ($entity_type:expr, $operation:expr, $chunk_size:expr) => {
        tracing::info_span!(
            "relkit.chunk",
            entity_type = %$entity_type,
            operation = %$operation,
            chunk_size = $chunk_size
        )
    };
}

/// Span around one similarity or full-text search.
#[macro_export]
macro_rules! search_span {
    ($entity_type:expr, $method:expr) => {
        tracing::info_span!("relkit.search", entity_type = %$entity_type, method = %$method)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const CONSOLIDATION: &str = "relkit.consolidation";
    pub const UPSERT: &str = "relkit.upsert";
    pub const CHUNK: &str = "relkit.chunk";
    pub const SEARCH: &str = "relkit.search";
}
