//! `atomic` blocks: commit, rollback, nesting, and re-entrant storage calls.

use serde_json::json;

use relkit_core::errors::{RelkitError, RelkitResult};
use relkit_core::traits::IEntityStorage;
use test_fixtures::{count, create, open_engine, values};

#[test]
fn atomic_commits_on_success() {
    let engine = open_engine("merge");
    let created = engine
        .atomic(|| engine.create("person", &values(json!({ "name": "in tx" }))))
        .unwrap();
    assert_eq!(engine.transaction_depth(), 0);
    assert!(engine.get("person", created.pk).unwrap().is_some());
}

#[test]
fn atomic_rolls_back_every_write_on_error() {
    let engine = open_engine("merge");
    let keep = create(&engine, "person", json!({ "name": "keep" }));

    let result: RelkitResult<()> = engine.atomic(|| {
        engine.create("person", &values(json!({ "name": "gone" })))?;
        let mut k = engine.get("person", keep.pk)?.unwrap();
        k.set("name", json!("changed"));
        engine.save(&k)?;
        Err(RelkitError::ValidationError {
            reason: "abort".into(),
        })
    });

    assert!(result.is_err());
    assert_eq!(count(&engine, "person"), 1);
    let k = engine.get("person", keep.pk).unwrap().unwrap();
    assert_eq!(k.get("name"), json!("keep"));
    assert_eq!(engine.history("person", keep.pk).unwrap().len(), 1);
}

#[test]
fn inner_failure_leaves_outer_work_intact() {
    let engine = open_engine("merge");
    engine
        .atomic(|| {
            engine.create("club", &values(json!({ "name": "outer" })))?;
            let inner: RelkitResult<()> = engine.atomic(|| {
                engine.create("club", &values(json!({ "name": "inner" })))?;
                assert_eq!(engine.transaction_depth(), 2);
                Err(RelkitError::ValidationError {
                    reason: "inner".into(),
                })
            });
            assert!(inner.is_err());
            Ok(())
        })
        .unwrap();
    assert_eq!(count(&engine, "club"), 1);
    assert_eq!(engine.transaction_depth(), 0);
}

#[test]
fn unique_violation_inside_atomic_can_be_recovered() {
    let engine = open_engine("merge");
    create(&engine, "club", json!({ "name": "dup" }));
    let outcome = engine
        .atomic(|| {
            match engine.create("club", &values(json!({ "name": "dup" }))) {
                Err(e) if e.is_unique_violation() => {}
                other => panic!("expected unique violation, got {other:?}"),
            }
            engine.create("club", &values(json!({ "name": "fresh" })))
        })
        .unwrap();
    assert_eq!(outcome.get("name"), json!("fresh"));
    assert_eq!(count(&engine, "club"), 2);
}

#[test]
fn deferred_foreign_keys_are_checked_at_commit() {
    let engine = open_engine("merge");
    let result = engine.atomic(|| engine.create("person", &values(json!({ "mentor_id": 4242 }))));
    assert!(result.is_err());
    assert_eq!(count(&engine, "person"), 0);
}

#[test]
fn dangling_reference_can_be_repaired_before_commit() {
    let engine = open_engine("merge");
    engine
        .atomic(|| {
            let mut p = engine.create("person", &values(json!({ "mentor_id": 4242 })))?;
            p.set("mentor", serde_json::Value::Null);
            engine.save(&p)
        })
        .unwrap();
    assert_eq!(count(&engine, "person"), 1);
}
