//! Similarity helpers anchored on one stored entity.
//!
//! The score helpers compare `text` against the entity itself; the
//! `similar_by_*` helpers search every other entity of its type. When `text`
//! is `None` the entity's own search text is used.

use relkit_core::entity::{Entity, Filter};
use relkit_core::errors::{RelkitError, RelkitResult};
use relkit_core::traits::IEntityStorage;
use relkit_queryset::QuerySet;

use crate::document::search_text;
use crate::similarity::{self, FuzzyOptions, Scored};

pub fn fuzzy_ratio<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    fields: &[&str],
    text: Option<&str>,
    options: &FuzzyOptions,
) -> RelkitResult<u32> {
    let text = query_text(entity, fields, text);
    let options = FuzzyOptions {
        min_ratio: None,
        ..options.clone()
    };
    let scored = similarity::fuzzy_ratios(&itself(storage, entity), fields, &text, &options)?;
    first_score(entity, scored)
}

pub fn similar_by_fuzzy_ratios<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    fields: &[&str],
    text: Option<&str>,
    options: &FuzzyOptions,
) -> RelkitResult<Vec<Scored<u32>>> {
    let text = query_text(entity, fields, text);
    similarity::fuzzy_ratios(&others(storage, entity)?, fields, &text, options)
}

/// `None` when the entity's text is empty.
pub fn levenshtein_difference<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    fields: &[&str],
    text: Option<&str>,
) -> RelkitResult<Option<f64>> {
    let text = query_text(entity, fields, text);
    ensure_exists(storage, entity)?;
    let scored =
        similarity::levenshtein_differences(&itself(storage, entity), fields, &text, None)?;
    Ok(scored.into_iter().next().map(|s| s.score))
}

pub fn similar_by_levenshtein_differences<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    fields: &[&str],
    text: Option<&str>,
    max_difference: Option<f64>,
) -> RelkitResult<Vec<Scored<f64>>> {
    let text = query_text(entity, fields, text);
    similarity::levenshtein_differences(&others(storage, entity)?, fields, &text, max_difference)
}

pub fn tfidf_similarity<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    fields: &[&str],
    text: Option<&str>,
) -> RelkitResult<f64> {
    let text = query_text(entity, fields, text);
    let scored = similarity::tfidf_similarities(&itself(storage, entity), fields, &text, None)?;
    first_score(entity, scored)
}

pub fn similar_by_tfidf_similarity<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    fields: &[&str],
    text: Option<&str>,
    min_similarity: Option<f64>,
) -> RelkitResult<Vec<Scored<f64>>> {
    let text = query_text(entity, fields, text);
    similarity::tfidf_similarities(&others(storage, entity)?, fields, &text, min_similarity)
}

pub fn trigram_similarity<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    fields: &[&str],
    text: Option<&str>,
) -> RelkitResult<f64> {
    let text = query_text(entity, fields, text);
    let scored = similarity::trigram_similarities(&itself(storage, entity), fields, &text, None)?;
    first_score(entity, scored)
}

pub fn similar_by_trigram_similarity<S: IEntityStorage>(
    storage: &S,
    entity: &Entity,
    fields: &[&str],
    text: Option<&str>,
    min_similarity: Option<f64>,
) -> RelkitResult<Vec<Scored<f64>>> {
    let text = query_text(entity, fields, text);
    similarity::trigram_similarities(&others(storage, entity)?, fields, &text, min_similarity)
}

fn query_text(entity: &Entity, fields: &[&str], text: Option<&str>) -> String {
    match text {
        Some(text) => text.to_string(),
        None => search_text(entity, fields),
    }
}

fn itself<'a, S: IEntityStorage>(storage: &'a S, entity: &Entity) -> QuerySet<'a, S> {
    QuerySet::filtered(storage, entity.entity_type.clone(), Filter::pk_in(&[entity.pk]))
}

fn others<'a, S: IEntityStorage>(storage: &'a S, entity: &Entity) -> RelkitResult<QuerySet<'a, S>> {
    QuerySet::all(storage, entity.entity_type.clone()).exclude_pk(entity.pk)
}

fn ensure_exists<S: IEntityStorage>(storage: &S, entity: &Entity) -> RelkitResult<()> {
    match storage.get(&entity.entity_type, entity.pk)? {
        Some(_) => Ok(()),
        None => Err(not_found(entity)),
    }
}

fn first_score<T>(entity: &Entity, scored: Vec<Scored<T>>) -> RelkitResult<T> {
    scored
        .into_iter()
        .next()
        .map(|s| s.score)
        .ok_or_else(|| not_found(entity))
}

fn not_found(entity: &Entity) -> RelkitError {
    RelkitError::EntityNotFound {
        entity_type: entity.entity_type.clone(),
        pk: entity.pk,
    }
}
