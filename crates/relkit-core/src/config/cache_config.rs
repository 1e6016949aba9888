use serde::{Deserialize, Serialize};

use super::defaults;

/// Key-value cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Timeout applied when a write does not supply one.
    pub default_timeout_secs: u64,
    /// Max entries held by the in-memory backend.
    pub max_capacity: u64,
    /// Hash keys with blake3 before storing.
    pub hash_keys: bool,
    /// Directory for the file backend. `None` selects the in-memory backend.
    pub file_dir: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: defaults::DEFAULT_CACHE_TIMEOUT_SECS,
            max_capacity: defaults::DEFAULT_CACHE_MAX_CAPACITY,
            hash_keys: defaults::DEFAULT_HASH_KEYS,
            file_dir: None,
        }
    }
}
