//! Trigram similarity with pg_trgm semantics.
//!
//! Text is lowercased and split into words on non-alphanumeric characters.
//! Each word is padded with two spaces in front and one behind, then cut into
//! every 3-character window. Similarity is shared trigrams over the union.

use std::collections::BTreeSet;

/// Distinct trigrams of `text`.
pub fn trigrams(text: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = format!("  {} ", word.to_lowercase()).chars().collect();
        for window in padded.windows(3) {
            out.insert(window.iter().collect());
        }
    }
    out
}

/// `|A ∩ B| / |A ∪ B|` over trigram sets; 0 when neither text has a word.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = trigrams(a);
    let b = trigrams(b);
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}
