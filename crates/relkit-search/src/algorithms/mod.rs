//! Pure text-similarity algorithms. No storage access.

pub mod fuzzy;
pub mod levenshtein;
pub mod tfidf;
pub mod trigram;

pub use fuzzy::{partial_ratio, ratio};
pub use levenshtein::{levenshtein, levenshtein_difference};
pub use tfidf::TfidfModel;
