//! # relkit-search
//!
//! Text similarity over entity fields. Pure algorithms live in
//! [`algorithms`]; the queryset and per-entity helpers score stored
//! entities against a query text.

pub mod algorithms;
pub mod document;
pub mod entity;
pub mod fulltext;
pub mod similarity;

pub use document::search_text;
pub use fulltext::{full_text_search, run_partial_search, run_partial_search_with_config};
pub use similarity::{
    fuzzy_ratio_best_match, fuzzy_ratios, levenshtein_difference_best_match,
    levenshtein_differences, tfidf_similarities, tfidf_similarity_best_match,
    trigram_similarities, trigram_similarity_best_match, FuzzyOptions, Scored,
};
