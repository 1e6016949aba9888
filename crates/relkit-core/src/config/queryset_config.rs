use serde::{Deserialize, Serialize};

use super::defaults;

/// Defaults for `create_or_update` / `get_if_exists`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsertConfig {
    pub empty_lists_are_null: bool,
    pub search_nulls: bool,
    pub save_nulls: bool,
}

impl Default for UpsertConfig {
    fn default() -> Self {
        Self {
            empty_lists_are_null: defaults::DEFAULT_EMPTY_LISTS_ARE_NULL,
            search_nulls: defaults::DEFAULT_SEARCH_NULLS,
            save_nulls: defaults::DEFAULT_SAVE_NULLS,
        }
    }
}

/// Chunked iteration and bulk mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: defaults::DEFAULT_CHUNK_SIZE,
        }
    }
}
