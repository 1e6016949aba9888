//! Chunked iteration, sampling, and chunked bulk mutation.

use std::collections::BTreeSet;

use serde_json::json;

use relkit_core::config::ChunkingConfig;
use relkit_core::entity::{Condition, Filter};
use relkit_core::errors::RelkitError;
use relkit_queryset::QuerySet;
use test_fixtures::{count, open_engine, seed_testapp, values};

// --- chunk ---

#[test]
fn chunk_yields_every_entity_once() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 50);
    let qs = QuerySet::all(&engine, "test_model");

    let pks: Vec<i64> = qs
        .chunk(7, false)
        .unwrap()
        .map(|e| e.unwrap().pk)
        .collect();
    assert_eq!(pks, (1..=50).collect::<Vec<i64>>());
}

#[test]
fn randomized_chunk_covers_the_selection() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 50);
    let qs = QuerySet::all(&engine, "test_model");

    let pks: BTreeSet<i64> = qs
        .chunk(ChunkingConfig::default().chunk_size, true)
        .unwrap()
        .map(|e| e.unwrap().pk)
        .collect();
    assert_eq!(pks.len(), count(&engine, "test_model"));
}

#[test]
fn chunk_respects_the_filter() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 20);
    let qs = QuerySet::filtered(&engine, "test_model", Filter::pk_in(&[2, 4, 6, 8]));
    let items: Vec<_> = qs.chunk(3, true).unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(items.len(), 4);
}

#[test]
fn chunk_skips_rows_deleted_mid_iteration() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 10);
    let qs = QuerySet::all(&engine, "test_model");
    let mut iter = qs.chunk(5, false).unwrap();

    assert_eq!(iter.next().unwrap().unwrap().pk, 1);
    QuerySet::filtered(&engine, "test_model", Filter::pk_in(&[7, 8]))
        .chunk_delete(10)
        .unwrap();
    let rest: Vec<i64> = iter.map(|e| e.unwrap().pk).collect();
    assert_eq!(rest, vec![2, 3, 4, 5, 6, 9, 10]);
}

#[test]
fn zero_chunk_size_is_a_validation_error() {
    let engine = open_engine("testapp");
    let qs = QuerySet::all(&engine, "test_model");
    assert!(matches!(
        qs.chunk(0, false).err(),
        Some(RelkitError::ValidationError { .. })
    ));
}

// --- sample ---

#[test]
fn sample_draws_distinct_entities() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 50);
    let qs = QuerySet::all(&engine, "test_model");

    let sample = qs.sample(10).unwrap();
    assert_eq!(sample.len(), 10);
    let distinct: BTreeSet<i64> = sample.iter().map(|e| e.pk).collect();
    assert_eq!(distinct.len(), 10);
}

#[test]
fn oversized_sample_returns_everything() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 5);
    let qs = QuerySet::all(&engine, "test_model");
    assert_eq!(qs.sample(100).unwrap().len(), 5);
}

// --- chunk_update / chunk_delete ---

#[test]
fn chunk_update_touches_only_the_selection() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 30);
    let qs = QuerySet::filtered(&engine, "test_model", Filter::pk_in(&(1..=12).collect::<Vec<_>>()));

    let rows = qs
        .chunk_update(5, &values(json!({ "text_field": "bulk" })))
        .unwrap();
    assert_eq!(rows, 12);

    let updated = QuerySet::filtered(&engine, "test_model", Filter::exact("text_field", "bulk"));
    assert_eq!(updated.count().unwrap(), 12);
}

#[test]
fn chunk_delete_empties_the_type() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 50);
    let qs = QuerySet::all(&engine, "test_model");

    assert_eq!(qs.chunk_delete(ChunkingConfig::default().chunk_size).unwrap(), 50);
    assert_eq!(count(&engine, "test_model"), 0);
    assert_eq!(count(&engine, "second_test_model"), 50);
}

#[test]
fn chunk_delete_cascades_to_dependents() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 10);
    let qs = QuerySet::filtered(
        &engine,
        "second_test_model",
        Filter::and(vec![Condition::In("id".into(), vec![json!(1), json!(2), json!(3)])]),
    );

    assert_eq!(qs.chunk_delete(2).unwrap(), 3);
    assert_eq!(count(&engine, "second_test_model"), 7);
    assert_eq!(count(&engine, "test_model"), 7);
}
