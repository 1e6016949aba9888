use serde::{Deserialize, Serialize};

use super::defaults;

/// Merge engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Source scalar values replace non-null target values.
    pub overwrite: bool,
    /// Allow merges that cascade into additional related pairs.
    pub consolidate_related_uniques: bool,
    /// Recursion limit for conflict discovery.
    pub max_depth: usize,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            overwrite: defaults::DEFAULT_OVERWRITE,
            consolidate_related_uniques: defaults::DEFAULT_CONSOLIDATE_RELATED_UNIQUES,
            max_depth: defaults::DEFAULT_MAX_DISCOVERY_DEPTH,
        }
    }
}
