//! get_if_exists / create_or_update against the testapp and merge schemas.

use serde_json::json;

use relkit_core::errors::RelkitError;
use relkit_core::traits::IEntityStorage;
use relkit_queryset::{QuerySet, UpsertOptions};
use relkit_storage::StorageEngine;
use test_fixtures::{count, create, open_engine, seed_testapp, values};

fn seeded() -> StorageEngine {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 10);
    engine
}

// --- get_if_exists ---

#[test]
fn finds_by_pk() {
    let engine = seeded();
    let qs = QuerySet::all(&engine, "test_model");
    let found = qs
        .get_if_exists(&values(json!({ "pk": 1 })), &UpsertOptions::default())
        .unwrap();
    assert_eq!(found.map(|e| e.pk), Some(1));
}

#[test]
fn match_any_ors_the_criteria() {
    let engine = seeded();
    let qs = QuerySet::all(&engine, "test_model");
    let first = engine.get("test_model", 1).unwrap().unwrap();
    let criteria = values(json!({ "pk": 123456, "text_field": first.get("text_field") }));

    let found = qs
        .get_if_exists(&criteria, &UpsertOptions::default().match_any())
        .unwrap();
    assert_eq!(found.map(|e| e.pk), Some(1));

    let strict = qs.get_if_exists(&criteria, &UpsertOptions::default()).unwrap();
    assert!(strict.is_none());
}

#[test]
fn empty_list_criteria_are_ignored_as_nulls() {
    let engine = seeded();
    let qs = QuerySet::all(&engine, "test_model");
    let found = qs
        .get_if_exists(
            &values(json!({ "pk": 1, "text_field": [] })),
            &UpsertOptions::default().match_any().empty_lists_are_null(true),
        )
        .unwrap();
    assert_eq!(found.map(|e| e.pk), Some(1));
}

#[test]
fn null_criteria_are_dropped_unless_searched() {
    let engine = seeded();
    let qs = QuerySet::all(&engine, "second_test_model");
    let criteria = values(json!({ "text_field": null }));

    // Nothing left to search on.
    assert!(qs.get_if_exists(&criteria, &UpsertOptions::default()).unwrap().is_none());
    // No row has a null text yet.
    assert!(qs
        .get_if_exists(&criteria, &UpsertOptions::default().search_nulls())
        .unwrap()
        .is_none());

    engine
        .update_where(
            "second_test_model",
            &relkit_core::Filter::exact("id", 1),
            &values(json!({ "text_field": null })),
        )
        .unwrap();
    let found = qs
        .get_if_exists(&criteria, &UpsertOptions::default().search_nulls())
        .unwrap();
    assert_eq!(found.map(|e| e.pk), Some(1));
}

#[test]
fn multiple_matches_are_an_error() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 20);
    let qs = QuerySet::all(&engine, "test_model");
    let text = engine.get("test_model", 1).unwrap().unwrap().get("text_field");

    let err = qs
        .get_if_exists(&values(json!({ "text_field": text })), &UpsertOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        RelkitError::MultipleObjectsReturned { count: 2, .. }
    ));
}

#[test]
fn lookup_is_scoped_to_the_queryset() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 20);
    let text = engine.get("test_model", 1).unwrap().unwrap().get("text_field");
    let qs = QuerySet::filtered(&engine, "test_model", relkit_core::Filter::pk_in(&[11, 12, 13]));

    let found = qs
        .get_if_exists(&values(json!({ "text_field": text })), &UpsertOptions::default())
        .unwrap();
    assert_eq!(found.map(|e| e.pk), Some(11));
}

#[test]
fn list_criteria_match_by_overlap() {
    let engine = open_engine("merge");
    create(&engine, "person", json!({ "name": "ada", "nicknames": ["a", "lovelace"] }));
    let qs = QuerySet::all(&engine, "person");
    let criteria = values(json!({ "nicknames": ["lovelace", "countess"] }));

    assert!(qs.get_if_exists(&criteria, &UpsertOptions::default()).unwrap().is_none());
    let found = qs
        .get_if_exists(&criteria, &UpsertOptions::default().allow_list_overlaps())
        .unwrap();
    assert_eq!(found.map(|e| e.get("name")), Some(json!("ada")));
}

#[test]
fn joined_lookups_follow_foreign_keys() {
    let engine = seeded();
    let qs = QuerySet::all(&engine, "test_model");
    let second = engine.get("second_test_model", 4).unwrap().unwrap();
    let criteria = values(json!({ "second_related_object__text_field": second.get("text_field") }));

    let found = qs.get_if_exists(&criteria, &UpsertOptions::default()).unwrap();
    assert_eq!(found.map(|e| e.pk), Some(4));
}

#[test]
fn joins_through_scalars_are_rejected() {
    let engine = seeded();
    let qs = QuerySet::all(&engine, "test_model");
    let err = qs
        .get_if_exists(&values(json!({ "text_field__name": "x" })), &UpsertOptions::default())
        .unwrap_err();
    assert!(matches!(err, RelkitError::ValidationError { .. }));
}

// --- create_or_update ---

#[test]
fn only_update_existing_nulls_preserves_values() {
    let engine = seeded();
    let qs = QuerySet::all(&engine, "test_model");
    let new_text = "testing one two three";
    let criteria = values(json!({ "pk": 1 }));
    let updates = values(json!({ "text_field": new_text }));

    let obj = qs
        .create_or_update(&criteria, Some(&updates), &UpsertOptions::default().only_update_existing_nulls())
        .unwrap();
    assert_ne!(obj.get("text_field"), json!(new_text));

    let obj = qs
        .create_or_update(&criteria, Some(&updates), &UpsertOptions::default())
        .unwrap();
    assert_eq!(obj.get("text_field"), json!(new_text));
    assert_eq!(count(&engine, "test_model"), 10);
}

#[test]
fn nulls_are_saved_only_when_asked() {
    let engine = seeded();
    let qs = QuerySet::all(&engine, "second_test_model");
    let criteria = values(json!({ "pk": 1 }));
    let updates = values(json!({ "text_field": null }));

    let obj = qs
        .create_or_update(&criteria, Some(&updates), &UpsertOptions::default())
        .unwrap();
    assert!(!obj.is_null("text_field"));

    let obj = qs
        .create_or_update(&criteria, Some(&updates), &UpsertOptions::default().save_nulls())
        .unwrap();
    assert!(obj.is_null("text_field"));
    assert!(engine.get("second_test_model", 1).unwrap().unwrap().is_null("text_field"));
}

#[test]
fn null_lookup_fills_the_null_row() {
    let engine = seeded();
    engine
        .update_where(
            "second_test_model",
            &relkit_core::Filter::exact("id", 1),
            &values(json!({ "text_field": null })),
        )
        .unwrap();
    let qs = QuerySet::all(&engine, "second_test_model");

    let obj = qs
        .create_or_update(
            &values(json!({ "text_field": null })),
            Some(&values(json!({ "text_field": "woot" }))),
            &UpsertOptions::default().only_update_existing_nulls().search_nulls(),
        )
        .unwrap();
    assert_eq!(obj.pk, 1);
    assert_eq!(obj.get("text_field"), json!("woot"));
}

#[test]
fn miss_creates_from_criteria_and_updates() {
    let engine = open_engine("merge");
    let qs = QuerySet::all(&engine, "person");

    let obj = qs
        .create_or_update(
            &values(json!({ "email": "grace@navy.mil", "mentor__name": "ignored" })),
            Some(&values(json!({
                "name": "grace",
                "email": "other@navy.mil",
                "score": null,
                "unknown": 1,
            }))),
            &UpsertOptions::default(),
        )
        .unwrap();
    assert_eq!(obj.get("email"), json!("grace@navy.mil"));
    assert_eq!(obj.get("name"), json!("grace"));
    assert!(obj.is_null("score"));
    assert_eq!(count(&engine, "person"), 1);

    let again = qs
        .create_or_update(
            &values(json!({ "email": "grace@navy.mil" })),
            Some(&values(json!({ "score": 7 }))),
            &UpsertOptions::default(),
        )
        .unwrap();
    assert_eq!(again.pk, obj.pk);
    assert_eq!(again.get("score"), json!(7));
    assert_eq!(again.get("name"), json!("grace"));
    assert_eq!(count(&engine, "person"), 1);
}

#[test]
fn no_updates_returns_the_existing_entity() {
    let engine = seeded();
    let qs = QuerySet::all(&engine, "test_model");
    let before = engine.get("test_model", 3).unwrap().unwrap();
    let obj = qs
        .create_or_update(&values(json!({ "pk": 3 })), None, &UpsertOptions::default())
        .unwrap();
    assert_eq!(obj, before);
}

#[test]
fn list_updates_append_missing_elements_with_overlaps() {
    let engine = open_engine("merge");
    create(&engine, "person", json!({ "email": "a@x", "nicknames": ["a", "b"] }));
    let qs = QuerySet::all(&engine, "person");
    let criteria = values(json!({ "email": "a@x" }));

    let obj = qs
        .create_or_update(
            &criteria,
            Some(&values(json!({ "nicknames": ["b", "c"] }))),
            &UpsertOptions::default().allow_list_overlaps(),
        )
        .unwrap();
    assert_eq!(obj.get("nicknames"), json!(["a", "b", "c"]));

    let obj = qs
        .create_or_update(
            &criteria,
            Some(&values(json!({ "nicknames": ["z"] }))),
            &UpsertOptions::default(),
        )
        .unwrap();
    assert_eq!(obj.get("nicknames"), json!(["z"]));
}

#[test]
fn relation_updates_accept_attribute_names() {
    let engine = open_engine("merge");
    let mentor = create(&engine, "person", json!({ "email": "m@x" }));
    create(&engine, "person", json!({ "email": "p@x" }));
    let qs = QuerySet::all(&engine, "person");

    let obj = qs
        .create_or_update(
            &values(json!({ "email": "p@x" })),
            Some(&values(json!({ "mentor_id": mentor.pk }))),
            &UpsertOptions::default(),
        )
        .unwrap();
    assert_eq!(obj.related_pk("mentor"), Some(mentor.pk));
}

#[test]
fn unique_collision_on_forced_create_falls_back_to_update() {
    let engine = open_engine("merge");
    let existing = create(&engine, "person", json!({ "email": "dup@x", "name": "old" }));
    let qs = QuerySet::all(&engine, "person");

    let obj = qs
        .create_or_update(
            &values(json!({ "email": "dup@x" })),
            Some(&values(json!({ "name": "new" }))),
            &UpsertOptions::default().force_create(),
        )
        .unwrap();
    assert_eq!(obj.pk, existing.pk);
    assert_eq!(obj.get("name"), json!("new"));
    assert_eq!(count(&engine, "person"), 1);
}

#[test]
fn unique_collision_without_a_match_is_returned() {
    let engine = open_engine("merge");
    create(&engine, "person", json!({ "email": "taken@x" }));
    let qs = QuerySet::all(&engine, "person");

    // The lookup is on name, which matches nothing; the insert collides on email.
    let err = qs
        .create_or_update(
            &values(json!({ "name": "nobody" })),
            Some(&values(json!({ "email": "taken@x" }))),
            &UpsertOptions::default(),
        )
        .unwrap_err();
    assert!(err.is_unique_violation());
    assert_eq!(count(&engine, "person"), 1);
}

#[test]
fn options_follow_config_defaults() {
    let config = relkit_core::config::UpsertConfig {
        empty_lists_are_null: false,
        search_nulls: true,
        save_nulls: true,
    };
    let options = UpsertOptions::from(&config);
    assert!(!options.empty_lists_are_null);
    assert!(options.search_nulls);
    assert!(options.save_nulls);
    assert!(!options.match_any);
    assert!(!options.force_create);

    let defaults = UpsertOptions::default();
    assert!(defaults.empty_lists_are_null);
    assert!(!defaults.save_nulls);
}
