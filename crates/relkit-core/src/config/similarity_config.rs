use serde::{Deserialize, Serialize};

use super::defaults;

/// Thresholds for the `similar_by_*` helpers and search result limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Fuzzy ratio (0-100) a candidate must reach.
    pub min_fuzzy_ratio: u32,
    /// Max gap between full and partial ratio when partial matching is allowed.
    pub max_partial_difference: u32,
    /// Max normalized edit distance.
    pub max_levenshtein_difference: f64,
    pub min_tfidf_similarity: f64,
    pub min_trigram_similarity: f64,
    pub max_search_results: usize,
    pub min_search_rank: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            min_fuzzy_ratio: defaults::DEFAULT_MIN_FUZZY_RATIO,
            max_partial_difference: defaults::DEFAULT_MAX_PARTIAL_DIFFERENCE,
            max_levenshtein_difference: defaults::DEFAULT_MAX_LEVENSHTEIN_DIFFERENCE,
            min_tfidf_similarity: defaults::DEFAULT_MIN_TFIDF_SIMILARITY,
            min_trigram_similarity: defaults::DEFAULT_MIN_TRIGRAM_SIMILARITY,
            max_search_results: defaults::DEFAULT_MAX_SEARCH_RESULTS,
            min_search_rank: defaults::DEFAULT_MIN_SEARCH_RANK,
        }
    }
}
