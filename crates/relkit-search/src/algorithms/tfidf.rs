//! TF-IDF vectors and cosine similarity.
//!
//! Tokens are lowercased runs of two or more word characters. Inverse
//! document frequency is smoothed, `ln((1 + n) / (1 + df)) + 1`, and every
//! vector is L2-normalized, so cosine similarity is a dot product.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

static TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").ok());

/// Lowercased tokens of `text`, in order, with repeats.
pub fn tokenize(text: &str) -> Vec<String> {
    let Some(pattern) = TOKEN.as_ref() else {
        return Vec::new();
    };
    let lower = text.to_lowercase();
    pattern
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Sparse vector keyed by vocabulary index.
pub type SparseVector = HashMap<usize, f64>;

/// A vocabulary and idf weights fitted on a corpus.
#[derive(Debug, Clone, Default)]
pub struct TfidfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfModel {
    /// Fit on `documents`.
    pub fn fit<T: AsRef<str>>(documents: &[T]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();

        for doc in documents {
            let mut seen = HashSet::new();
            for token in tokenize(doc.as_ref()) {
                let next = vocabulary.len();
                let index = *vocabulary.entry(token).or_insert(next);
                if index == document_frequency.len() {
                    document_frequency.push(0);
                }
                if seen.insert(index) {
                    document_frequency[index] += 1;
                }
            }
        }

        let n = documents.len() as f64;
        let idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        Self { vocabulary, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// L2-normalized tf-idf vector of `text`. Tokens outside the vocabulary
    /// are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut vector = SparseVector::new();
        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *vector.entry(index).or_default() += 1.0;
            }
        }
        for (index, weight) in vector.iter_mut() {
            *weight *= self.idf[*index];
        }
        let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in vector.values_mut() {
                *weight /= norm;
            }
        }
        vector
    }
}

/// Cosine similarity of two L2-normalized sparse vectors.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(index, weight)| large.get(index).map(|other| weight * other))
        .sum()
}

/// Similarity of `query` to each document, in document order.
pub fn similarities<T: AsRef<str>>(documents: &[T], query: &str) -> Vec<f64> {
    let model = TfidfModel::fit(documents);
    let query = model.transform(query);
    documents
        .iter()
        .map(|doc| cosine(&model.transform(doc.as_ref()), &query))
        .collect()
}
