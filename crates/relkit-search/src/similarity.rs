//! Similarity of a query text to every entity in a queryset.
//!
//! Each helper returns the entities with their score, best match first.
//! Ties keep pk order.

use std::cmp::Ordering;

use relkit_core::config::SimilarityConfig;
use relkit_core::entity::Entity;
use relkit_core::errors::RelkitResult;
use relkit_core::traits::IEntityStorage;
use relkit_observability::search_span;
use relkit_queryset::QuerySet;

use crate::algorithms::{fuzzy, levenshtein, tfidf, trigram};
use crate::document::{check_fields, search_text};

/// An entity with its score against a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    pub entity: Entity,
    pub score: T,
}

impl<T> Scored<T> {
    pub fn pk(&self) -> i64 {
        self.entity.pk
    }
}

/// Filters for fuzzy ratio searches.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyOptions {
    /// Minimum ratio kept; `None` keeps everything.
    pub min_ratio: Option<u32>,
    /// Score with the better of the full and partial ratio.
    pub allow_partial: bool,
    /// Drop matches whose full and partial ratios differ by more than this.
    pub max_partial_difference: u32,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            min_ratio: None,
            allow_partial: false,
            max_partial_difference: 100,
        }
    }
}

impl From<&SimilarityConfig> for FuzzyOptions {
    fn from(config: &SimilarityConfig) -> Self {
        Self {
            min_ratio: Some(config.min_fuzzy_ratio),
            allow_partial: false,
            max_partial_difference: config.max_partial_difference,
        }
    }
}

impl FuzzyOptions {
    pub fn partial(mut self) -> Self {
        self.allow_partial = true;
        self
    }

    pub fn min_ratio(mut self, min_ratio: u32) -> Self {
        self.min_ratio = Some(min_ratio);
        self
    }

    pub fn max_partial_difference(mut self, difference: u32) -> Self {
        self.max_partial_difference = difference;
        self
    }
}

// --- Fuzzy ratio ---

pub fn fuzzy_ratios<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    fields: &[&str],
    text: &str,
    options: &FuzzyOptions,
) -> RelkitResult<Vec<Scored<u32>>> {
    let span = search_span!(queryset.entity_type(), "fuzzy_ratio");
    let _guard = span.enter();

    let mut results = Vec::new();
    for entity in candidates(queryset, fields)? {
        let document = search_text(&entity, fields);
        let full = fuzzy::ratio(&document, text);
        let (score, variation) = if options.allow_partial {
            let partial = fuzzy::partial_ratio(&document, text);
            (full.max(partial), full.abs_diff(partial))
        } else {
            (full, 0)
        };
        let above_min = options.min_ratio.map_or(true, |min| score >= min);
        let consistent = !options.allow_partial || variation <= options.max_partial_difference;
        if above_min && consistent {
            results.push(Scored { entity, score });
        }
    }
    sort_descending(&mut results);
    Ok(results)
}

pub fn fuzzy_ratio_best_match<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    fields: &[&str],
    text: &str,
    options: &FuzzyOptions,
) -> RelkitResult<Option<Scored<u32>>> {
    Ok(fuzzy_ratios(queryset, fields, text, options)?.into_iter().next())
}

// --- Levenshtein difference ---

/// Normalized edit distance, smallest first. Entities with empty text are
/// skipped.
pub fn levenshtein_differences<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    fields: &[&str],
    text: &str,
    max_difference: Option<f64>,
) -> RelkitResult<Vec<Scored<f64>>> {
    let span = search_span!(queryset.entity_type(), "levenshtein");
    let _guard = span.enter();

    let mut results: Vec<Scored<f64>> = candidates(queryset, fields)?
        .into_iter()
        .filter_map(|entity| {
            let score = levenshtein::levenshtein_difference(&search_text(&entity, fields), text)?;
            Some(Scored { entity, score })
        })
        .filter(|s| max_difference.map_or(true, |max| s.score <= max))
        .collect();
    results.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
    Ok(results)
}

pub fn levenshtein_difference_best_match<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    fields: &[&str],
    text: &str,
    max_difference: Option<f64>,
) -> RelkitResult<Option<Scored<f64>>> {
    Ok(levenshtein_differences(queryset, fields, text, max_difference)?
        .into_iter()
        .next())
}

// --- TF-IDF ---

/// Cosine similarity of TF-IDF vectors fitted on the queryset's documents.
pub fn tfidf_similarities<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    fields: &[&str],
    text: &str,
    min_similarity: Option<f64>,
) -> RelkitResult<Vec<Scored<f64>>> {
    let span = search_span!(queryset.entity_type(), "tfidf");
    let _guard = span.enter();

    let entities = candidates(queryset, fields)?;
    let documents: Vec<String> = entities.iter().map(|e| search_text(e, fields)).collect();
    let scores = tfidf::similarities(&documents, text);

    let mut results: Vec<Scored<f64>> = entities
        .into_iter()
        .zip(scores)
        .map(|(entity, score)| Scored { entity, score })
        .filter(|s| above(s.score, min_similarity))
        .collect();
    sort_descending(&mut results);
    Ok(results)
}

pub fn tfidf_similarity_best_match<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    fields: &[&str],
    text: &str,
    min_similarity: Option<f64>,
) -> RelkitResult<Option<Scored<f64>>> {
    Ok(tfidf_similarities(queryset, fields, text, min_similarity)?
        .into_iter()
        .next())
}

// --- Trigram ---

pub fn trigram_similarities<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    fields: &[&str],
    text: &str,
    min_similarity: Option<f64>,
) -> RelkitResult<Vec<Scored<f64>>> {
    let span = search_span!(queryset.entity_type(), "trigram");
    let _guard = span.enter();

    let mut results: Vec<Scored<f64>> = candidates(queryset, fields)?
        .into_iter()
        .map(|entity| {
            let score = trigram::similarity(&search_text(&entity, fields), text);
            Scored { entity, score }
        })
        .filter(|s| above(s.score, min_similarity))
        .collect();
    sort_descending(&mut results);
    Ok(results)
}

pub fn trigram_similarity_best_match<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    fields: &[&str],
    text: &str,
    min_similarity: Option<f64>,
) -> RelkitResult<Option<Scored<f64>>> {
    Ok(trigram_similarities(queryset, fields, text, min_similarity)?
        .into_iter()
        .next())
}

fn candidates<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    fields: &[&str],
) -> RelkitResult<Vec<Entity>> {
    check_fields(queryset.model()?, fields)?;
    let entities = queryset.fetch()?;
    tracing::debug!(
        entity_type = %queryset.entity_type(),
        candidates = entities.len(),
        "scoring candidates"
    );
    Ok(entities)
}

/// A zero or missing minimum keeps everything.
fn above(score: f64, min: Option<f64>) -> bool {
    match min {
        Some(min) if min > 0.0 => score >= min,
        _ => true,
    }
}

fn sort_descending<T: PartialOrd>(results: &mut [Scored<T>]) {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}
