//! Delete inspection, related-object maps, and field-name helpers.

use serde_json::json;

use relkit_core::entity::{EntityRef, Filter};
use relkit_core::traits::IEntityStorage;
use relkit_queryset::inspection::{related_object_counts, related_objects, Related};
use relkit_queryset::{field_exists, get_all_field_names, QuerySet};
use test_fixtures::{count, create, open_engine, seed_testapp};

// --- inspect_delete ---

#[test]
fn deleting_seconds_cascades_to_firsts() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 50);

    let counts = QuerySet::all(&engine, "second_test_model")
        .inspect_delete()
        .unwrap()
        .counts();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts["second_test_model"], 50);
    assert_eq!(counts["test_model"], 50);

    let counts = QuerySet::all(&engine, "test_model")
        .inspect_delete()
        .unwrap()
        .counts();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts["test_model"], 50);
}

#[test]
fn single_entity_inspection() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 5);

    let inspection = QuerySet::filtered(&engine, "second_test_model", Filter::exact("id", 2))
        .inspect_delete()
        .unwrap();
    let counts = inspection.counts();
    assert_eq!(counts["second_test_model"], 1);
    assert_eq!(counts["test_model"], 1);
    assert!(inspection.contains(&EntityRef::new("test_model", 2)));
    assert!(!inspection.contains(&EntityRef::new("test_model", 1)));
}

#[test]
fn inspection_deletes_nothing() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 5);
    QuerySet::all(&engine, "second_test_model").inspect_delete().unwrap();
    assert_eq!(count(&engine, "second_test_model"), 5);
    assert_eq!(count(&engine, "test_model"), 5);
}

#[test]
fn inspection_matches_the_actual_delete() {
    let engine = open_engine("merge");
    let ada = create(&engine, "person", json!({ "name": "ada" }));
    let bob = create(&engine, "person", json!({ "name": "bob", "mentor": ada.pk }));
    let club = create(&engine, "club", json!({ "name": "chess" }));
    let team = create(&engine, "team", json!({ "name": "red" }));
    create(&engine, "membership", json!({ "person": ada.pk, "team": team.pk }));
    create(&engine, "passport", json!({ "number": "P1", "holder": ada.pk }));
    create(&engine, "tag", json!({ "content_type": "person", "object_id": ada.pk, "label": "x" }));
    create(&engine, "tag", json!({ "content_type": "club", "object_id": ada.pk, "label": "y" }));
    engine.set_many_to_many(&ada, "clubs", &[club.pk]).unwrap();
    engine.set_many_to_many(&ada, "follows", &[bob.pk]).unwrap();
    engine.set_many_to_many(&bob, "follows", &[ada.pk]).unwrap();

    let inspection = QuerySet::filtered(&engine, "person", Filter::exact("id", ada.pk))
        .inspect_delete()
        .unwrap();
    let counts = inspection.counts();
    assert_eq!(counts["person"], 1, "mentees are set null, not deleted");
    assert_eq!(counts["membership"], 1);
    assert_eq!(counts["passport"], 1);
    assert_eq!(counts["tag"], 1, "only tags pointing at a person");
    assert_eq!(counts["person_clubs"], 1);
    assert_eq!(counts["person_follows"], 2);
    assert!(!counts.contains_key("club"));
    assert!(!counts.contains_key("team"));

    let objects = inspection.objects(&engine).unwrap();
    assert_eq!(objects["passport"][0].get("number"), json!("P1"));

    engine.delete(&ada).unwrap();
    assert_eq!(count(&engine, "membership"), 0);
    assert_eq!(count(&engine, "passport"), 0);
    assert_eq!(count(&engine, "tag"), 1);
    assert_eq!(engine.table_row_count("person_clubs").unwrap(), 0);
    assert_eq!(engine.table_row_count("person_follows").unwrap(), 0);
    assert_eq!(count(&engine, "person"), 1);
}

#[test]
fn cascades_are_followed_transitively() {
    let engine = open_engine("merge");
    let ada = create(&engine, "person", json!({ "name": "ada" }));
    let project = create(&engine, "project", json!({ "name": "engine" }));
    create(&engine, "assignment", json!({ "person": ada.pk, "project": project.pk, "role": "dev" }));
    create(&engine, "assignment", json!({ "person": ada.pk, "project": project.pk, "role": "qa" }));

    let counts = QuerySet::filtered(&engine, "project", Filter::exact("id", project.pk))
        .inspect_delete()
        .unwrap()
        .counts();
    assert_eq!(counts["project"], 1);
    assert_eq!(counts["assignment"], 2);
    assert!(!counts.contains_key("person"));
}

// --- related objects ---

#[test]
fn related_objects_of_a_first() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 3);
    let first = engine.get("test_model", 1).unwrap().unwrap();

    let counts = related_object_counts(&engine, &first, false).unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts["second_related_object"], 1);

    let objects = related_objects(&engine, &first, false).unwrap();
    match &objects["second_related_object"] {
        Related::Single(Some(second)) => assert_eq!(second.pk, 1),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn related_objects_of_a_second() {
    let engine = open_engine("testapp");
    seed_testapp(&engine, 3);
    let second = engine.get("second_test_model", 1).unwrap().unwrap();

    let counts = related_object_counts(&engine, &second, false).unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts["first_related_object"], 1);
}

#[test]
fn nonzero_only_drops_empty_relations() {
    let engine = open_engine("merge");
    let ada = create(&engine, "person", json!({ "name": "ada" }));
    let club = create(&engine, "club", json!({ "name": "chess" }));
    engine.set_many_to_many(&ada, "clubs", &[club.pk]).unwrap();

    let all = related_object_counts(&engine, &ada, false).unwrap();
    assert_eq!(all["mentor"], 0);
    assert_eq!(all["clubs"], 1);
    assert!(all.contains_key("tags"));

    let nonzero = related_object_counts(&engine, &ada, true).unwrap();
    assert_eq!(nonzero.len(), 1);
    assert_eq!(nonzero["clubs"], 1);

    let objects = related_objects(&engine, &ada, true).unwrap();
    assert_eq!(objects.len(), 1);
    assert!(matches!(&objects["clubs"], Related::Many(clubs) if clubs.len() == 1));
}

// --- field names ---

#[test]
fn field_names_include_attribute_names() {
    let engine = open_engine("testapp");
    let schema = engine.schema();

    let names = get_all_field_names(schema, "test_model").unwrap();
    assert_eq!(names.len(), 4);
    for name in ["id", "text_field", "second_related_object", "second_related_object_id"] {
        assert!(names.iter().any(|n| n == name), "missing {name}");
    }

    let names = get_all_field_names(schema, "second_test_model").unwrap();
    assert!(names.iter().any(|n| n == "first_related_object"));
    assert!(get_all_field_names(schema, "missing_model").is_err());
}

#[test]
fn field_exists_checks_names_and_attnames() {
    let engine = open_engine("testapp");
    let schema = engine.schema();
    assert!(field_exists(schema, "test_model", "text_field"));
    assert!(field_exists(schema, "test_model", "second_related_object_id"));
    assert!(field_exists(schema, "test_model", "pk"));
    assert!(!field_exists(schema, "test_model", "fake_field"));
    assert!(!field_exists(schema, "no_such_type", "text_field"));
}
