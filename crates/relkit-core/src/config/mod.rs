//! Configuration, loaded from TOML. Every section falls back to its defaults.

mod cache_config;
mod consolidation_config;
pub mod defaults;
mod observability_config;
mod queryset_config;
mod similarity_config;
mod storage_config;

use serde::{Deserialize, Serialize};

pub use cache_config::CacheConfig;
pub use consolidation_config::ConsolidationConfig;
pub use observability_config::ObservabilityConfig;
pub use queryset_config::{ChunkingConfig, UpsertConfig};
pub use similarity_config::SimilarityConfig;
pub use storage_config::StorageConfig;

use crate::errors::{RelkitError, RelkitResult};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelkitConfig {
    pub storage: StorageConfig,
    pub consolidation: ConsolidationConfig,
    pub upsert: UpsertConfig,
    pub chunking: ChunkingConfig,
    pub similarity: SimilarityConfig,
    pub cache: CacheConfig,
    pub observability: ObservabilityConfig,
}

impl RelkitConfig {
    /// Parse a TOML document. Missing sections and keys take their defaults.
    pub fn from_toml(s: &str) -> RelkitResult<Self> {
        toml::from_str(s).map_err(|e| RelkitError::ConfigError(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &std::path::Path) -> RelkitResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RelkitError::ConfigError(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> RelkitResult<String> {
        toml::to_string(self).map_err(|e| RelkitError::ConfigError(e.to_string()))
    }
}
