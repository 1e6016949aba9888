//! Per-entity similarity helpers.

use relkit_core::config::SimilarityConfig;
use relkit_core::errors::RelkitError;
use relkit_core::traits::IEntityStorage;
use relkit_search::entity::{
    fuzzy_ratio, levenshtein_difference, similar_by_fuzzy_ratios,
    similar_by_levenshtein_differences, similar_by_tfidf_similarity,
    similar_by_trigram_similarity, tfidf_similarity, trigram_similarity,
};
use relkit_search::{FuzzyOptions, Scored};
use test_fixtures::{open_engine, seed_testapp};

const FIELDS: &[&str] = &["text_field"];

fn pks<T>(results: &[Scored<T>]) -> Vec<i64> {
    results.iter().map(Scored::pk).collect()
}

// --- scores against the entity itself ---

#[test]
fn own_text_scores_perfectly() {
    let engine = open_engine("testapp");
    let (firsts, _) = seed_testapp(&engine, 10);
    let fox = &firsts[0];

    assert_eq!(fuzzy_ratio(&engine, fox, FIELDS, None, &FuzzyOptions::default()).unwrap(), 100);
    assert_eq!(levenshtein_difference(&engine, fox, FIELDS, None).unwrap(), Some(0.0));
    assert_eq!(trigram_similarity(&engine, fox, FIELDS, None).unwrap(), 1.0);
    assert!((tfidf_similarity(&engine, fox, FIELDS, None).unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn explicit_text_is_compared() {
    let engine = open_engine("testapp");
    let (firsts, _) = seed_testapp(&engine, 10);
    let senate = &firsts[2];

    // Fitted on the entity alone every term weighs the same: 5 of its 6 terms
    // appear in the query.
    let score = tfidf_similarity(
        &engine,
        senate,
        FIELDS,
        Some("Senate passes annual budget resolution"),
    )
    .unwrap();
    assert!((score - (5.0f64 / 6.0).sqrt()).abs() < 1e-9);

    // Against an empty query the whole 43 character headline is deleted.
    assert_eq!(
        levenshtein_difference(&engine, &firsts[0], FIELDS, Some("")).unwrap(),
        Some(1.0)
    );
}

#[test]
fn min_ratio_does_not_hide_the_score() {
    let engine = open_engine("testapp");
    let (firsts, _) = seed_testapp(&engine, 10);

    let options = FuzzyOptions::default().min_ratio(99);
    let score = fuzzy_ratio(
        &engine,
        &firsts[1],
        FIELDS,
        Some("The quick brown fox jumps over the lazy dog"),
        &options,
    );
    assert_eq!(score.unwrap(), 86);
}

#[test]
fn deleted_entity_is_not_found() {
    let engine = open_engine("testapp");
    let (firsts, _) = seed_testapp(&engine, 3);
    let gone = firsts[0].clone();
    engine.delete(&gone).unwrap();

    let err = trigram_similarity(&engine, &gone, FIELDS, Some("fox")).unwrap_err();
    assert!(matches!(err, RelkitError::EntityNotFound { pk: 1, .. }));
    let err = levenshtein_difference(&engine, &gone, FIELDS, Some("fox")).unwrap_err();
    assert!(matches!(err, RelkitError::EntityNotFound { .. }));
}

// --- similar_by_* ---

#[test]
fn similar_entities_exclude_self() {
    let engine = open_engine("testapp");
    let (firsts, _) = seed_testapp(&engine, 10);
    let fox = &firsts[0];
    let config = SimilarityConfig::default();

    let trigram = similar_by_trigram_similarity(&engine, fox, FIELDS, None, Some(config.min_trigram_similarity)).unwrap();
    assert_eq!(pks(&trigram), vec![2]);

    let tfidf = similar_by_tfidf_similarity(&engine, fox, FIELDS, None, Some(config.min_tfidf_similarity)).unwrap();
    assert_eq!(pks(&tfidf), vec![2]);

    let levenshtein =
        similar_by_levenshtein_differences(&engine, fox, FIELDS, None, Some(config.max_levenshtein_difference)).unwrap();
    assert_eq!(pks(&levenshtein), vec![2]);
}

#[test]
fn similar_by_fuzzy_uses_thresholds() {
    let engine = open_engine("testapp");
    let (firsts, _) = seed_testapp(&engine, 10);
    let fox = &firsts[0];

    // The reordered headline scores 86.
    let strict = FuzzyOptions::from(&SimilarityConfig::default());
    assert!(similar_by_fuzzy_ratios(&engine, fox, FIELDS, None, &strict).unwrap().is_empty());

    let loose = strict.min_ratio(80);
    let results = similar_by_fuzzy_ratios(&engine, fox, FIELDS, None, &loose).unwrap();
    assert_eq!(pks(&results), vec![2]);
    assert_eq!(results[0].score, 86);
}

#[test]
fn similar_by_with_other_text() {
    let engine = open_engine("testapp");
    let (firsts, _) = seed_testapp(&engine, 10);

    // Searching from the sleep study headline for bakery stories.
    let results =
        similar_by_trigram_similarity(&engine, &firsts[5], FIELDS, Some("regional bakery competition"), Some(0.4))
            .unwrap();
    assert_eq!(pks(&results), vec![5, 10]);
}
