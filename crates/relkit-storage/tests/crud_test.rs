//! Entity CRUD, filters, and bulk operations against the SQLite gateway.

use serde_json::json;

use relkit_core::entity::{Condition, Filter};
use relkit_core::errors::RelkitError;
use relkit_core::traits::IEntityStorage;
use test_fixtures::{count, create, open_engine, values};

#[test]
fn create_then_get_returns_stored_values() {
    let engine = open_engine("merge");
    let person = create(
        &engine,
        "person",
        json!({ "name": "Ada", "email": "ada@example.com", "nicknames": ["A"], "score": 3 }),
    );
    let fetched = engine.get("person", person.pk).unwrap().unwrap();
    assert_eq!(fetched.get("name"), json!("Ada"));
    assert_eq!(fetched.get("nicknames"), json!(["A"]));
    assert_eq!(fetched.get("score"), json!(3));
    assert!(fetched.get("mentor").is_null());
}

#[test]
fn get_missing_returns_none() {
    let engine = open_engine("merge");
    assert!(engine.get("person", 999).unwrap().is_none());
}

#[test]
fn save_persists_changes_and_refresh_reloads() {
    let engine = open_engine("merge");
    let mut person = create(&engine, "person", json!({ "name": "Ada" }));
    person.set("name", json!("Ada L."));
    engine.save(&person).unwrap();

    let mut stale = person.clone();
    stale.set("name", json!("stale"));
    engine.refresh(&mut stale).unwrap();
    assert_eq!(stale.get("name"), json!("Ada L."));
}

#[test]
fn unique_violation_is_classified() {
    let engine = open_engine("merge");
    create(&engine, "person", json!({ "email": "dup@example.com" }));
    let err = engine
        .create("person", &values(json!({ "email": "dup@example.com" })))
        .unwrap_err();
    assert!(err.is_unique_violation(), "got {err}");
}

#[test]
fn composite_unique_violation_is_classified() {
    let engine = open_engine("merge");
    let p = create(&engine, "person", json!({}));
    let t = create(&engine, "team", json!({ "name": "core" }));
    create(&engine, "membership", json!({ "person": p.pk, "team": t.pk }));
    let err = engine
        .create("membership", &values(json!({ "person_id": p.pk, "team_id": t.pk })))
        .unwrap_err();
    assert!(err.is_unique_violation());
}

#[test]
fn unknown_field_is_rejected_on_create() {
    let engine = open_engine("merge");
    let err = engine
        .create("person", &values(json!({ "nope": 1 })))
        .unwrap_err();
    assert!(matches!(err, RelkitError::SchemaError(_)));
}

#[test]
fn reverse_relation_cannot_be_assigned() {
    let engine = open_engine("merge");
    let err = engine
        .create("person", &values(json!({ "mentees": [1] })))
        .unwrap_err();
    assert!(matches!(err, RelkitError::ValidationError { .. }));
}

#[test]
fn delete_removes_row_and_cascades() {
    let engine = open_engine("merge");
    let p = create(&engine, "person", json!({}));
    let t = create(&engine, "team", json!({}));
    create(&engine, "membership", json!({ "person": p.pk, "team": t.pk }));
    engine.delete(&p).unwrap();
    assert!(engine.get("person", p.pk).unwrap().is_none());
    assert_eq!(count(&engine, "membership"), 0);
    assert_eq!(count(&engine, "team"), 1);
}

#[test]
fn delete_sets_null_where_declared() {
    let engine = open_engine("merge");
    let mentor = create(&engine, "person", json!({}));
    let mentee = create(&engine, "person", json!({ "mentor": mentor.pk }));
    engine.delete(&mentor).unwrap();
    let mentee = engine.get("person", mentee.pk).unwrap().unwrap();
    assert!(mentee.get("mentor").is_null());
}

#[test]
fn delete_missing_is_not_found() {
    let engine = open_engine("merge");
    let p = create(&engine, "person", json!({}));
    engine.delete(&p).unwrap();
    let err = engine.delete(&p).unwrap_err();
    assert!(matches!(err, RelkitError::EntityNotFound { .. }));
}

#[test]
fn primary_keys_are_not_reused() {
    let engine = open_engine("merge");
    let first = create(&engine, "person", json!({}));
    engine.delete(&first).unwrap();
    let second = create(&engine, "person", json!({}));
    assert!(second.pk > first.pk);
}

#[test]
fn filters_support_and_or_null_in_and_overlap() {
    let engine = open_engine("merge");
    let a = create(&engine, "person", json!({ "name": "a", "nicknames": ["x", "y"] }));
    let b = create(&engine, "person", json!({ "name": "b", "nicknames": ["z"] }));
    let c = create(&engine, "person", json!({}));

    let pks = |f: Filter| engine.pks("person", &f).unwrap();

    assert_eq!(pks(Filter::exact("name", "a")), vec![a.pk]);
    assert_eq!(pks(Filter::exact("name", serde_json::Value::Null)), vec![c.pk]);
    assert_eq!(
        pks(Filter::or(vec![
            Condition::Exact("name".into(), json!("a")),
            Condition::Exact("name".into(), json!("b")),
        ])),
        vec![a.pk, b.pk]
    );
    assert_eq!(
        pks(Filter::and(vec![Condition::Overlap("nicknames".into(), vec![json!("y"), json!("q")])])),
        vec![a.pk]
    );
    assert_eq!(pks(Filter::pk_in(&[b.pk, c.pk])), vec![b.pk, c.pk]);
    assert!(pks(Filter::or(vec![])).is_empty());
    assert_eq!(pks(Filter::all()).len(), 3);
}

#[test]
fn overlap_on_scalar_field_is_rejected() {
    let engine = open_engine("merge");
    let err = engine
        .pks(
            "person",
            &Filter::and(vec![Condition::Overlap("name".into(), vec![json!("a")])]),
        )
        .unwrap_err();
    assert!(matches!(err, RelkitError::ValidationError { .. }));
}

#[test]
fn update_where_and_delete_where_report_rows() {
    let engine = open_engine("testapp");
    test_fixtures::seed_testapp(&engine, 6);

    let updated = engine
        .update_where("test_model", &Filter::all(), &values(json!({ "text_field": "same" })))
        .unwrap();
    assert_eq!(updated, 6);
    assert_eq!(engine.count("test_model", &Filter::exact("text_field", "same")).unwrap(), 6);

    let deleted = engine.delete_where("second_test_model", &Filter::all()).unwrap();
    assert_eq!(deleted, 6);
    // Cascaded through the foreign key.
    assert_eq!(count(&engine, "test_model"), 0);
}

#[test]
fn history_records_create_update_delete() {
    let engine = open_engine("merge");
    let mut p = create(&engine, "person", json!({ "name": "v1" }));
    p.set("name", json!("v2"));
    engine.save(&p).unwrap();
    let pk = p.pk;
    engine.delete(&p).unwrap();

    let history = engine.history("person", pk).unwrap();
    let kinds: Vec<&str> = history.iter().map(|h| h.change.as_str()).collect();
    assert_eq!(kinds, vec!["+", "~", "-"]);
    assert_eq!(history[1].values["name"], json!("v2"));
}

#[test]
fn rewrite_history_repoints_rows() {
    let engine = open_engine("merge");
    let a = create(&engine, "person", json!({}));
    let b = create(&engine, "person", json!({}));
    assert_eq!(engine.rewrite_history("person", a.pk, b.pk).unwrap(), 1);
    assert!(engine.history("person", a.pk).unwrap().is_empty());
    assert_eq!(engine.history("person", b.pk).unwrap().len(), 2);
}

#[test]
fn file_backed_engine_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relkit.db");
    let schema = test_fixtures::load_schema("testapp");
    {
        let engine = relkit_storage::StorageEngine::open(&path, schema.clone()).unwrap();
        engine
            .pool()
            .writer
            .with_conn_sync(|conn| {
                assert!(relkit_storage::pool::pragmas::verify_wal_mode(conn)?);
                assert!(relkit_storage::pool::pragmas::foreign_keys_enabled(conn)?);
                Ok(())
            })
            .unwrap();
        create(&engine, "second_test_model", json!({ "text_field": "kept" }));
    }
    let engine = relkit_storage::StorageEngine::open(&path, schema).unwrap();
    assert_eq!(count(&engine, "second_test_model"), 1);
}

#[test]
fn file_backed_engine_without_wal_keeps_rollback_journal() {
    let dir = tempfile::tempdir().unwrap();
    let config = relkit_core::config::StorageConfig {
        wal_mode: false,
        ..Default::default()
    };
    let engine = relkit_storage::StorageEngine::open_with_config(
        &dir.path().join("relkit.db"),
        test_fixtures::load_schema("testapp"),
        &config,
    )
    .unwrap();
    let wal = engine
        .pool()
        .writer
        .with_conn_sync(relkit_storage::pool::pragmas::verify_wal_mode)
        .unwrap();
    assert!(!wal);
}
