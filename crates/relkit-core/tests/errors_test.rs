use relkit_core::errors::*;
use relkit_core::EntityRef;

#[test]
fn entity_not_found_carries_type_and_pk() {
    let err = RelkitError::EntityNotFound {
        entity_type: "person".into(),
        pk: 42,
    };
    let msg = err.to_string();
    assert!(msg.contains("person"));
    assert!(msg.contains("42"));
}

#[test]
fn multiple_objects_returned_carries_count() {
    let err = RelkitError::MultipleObjectsReturned {
        entity_type: "team".into(),
        count: 3,
    };
    assert!(err.to_string().contains('3'));
}

#[test]
fn ambiguous_consolidation_names_pair_relation_and_values() {
    let err = ConsolidationError::AmbiguousConsolidation {
        merge_source: EntityRef::new("badge", 1),
        merge_target: EntityRef::new("badge", 2),
        requested_source: EntityRef::new("person", 10),
        requested_target: EntityRef::new("person", 11),
        relation: "issuer".into(),
        source_value: Some(EntityRef::new("org", 5)),
        target_value: None,
    };
    let msg = err.to_string();
    assert!(msg.contains("badge#1"));
    assert!(msg.contains("badge#2"));
    assert!(msg.contains("person#10"));
    assert!(msg.contains("issuer"));
    assert!(msg.contains("org#5"));
    assert!(msg.contains("null"));
}

#[test]
fn cascade_error_lists_additional_pairs() {
    let err = ConsolidationError::ConsolidationCascade {
        additional_pairs: vec![(EntityRef::new("badge", 1), EntityRef::new("badge", 2))],
    };
    let msg = err.to_string();
    assert!(msg.contains("1 additional"));
    assert!(msg.contains("badge#1 -> badge#2"));
}

// --- From impls ---

#[test]
fn storage_error_converts_to_relkit_error() {
    let storage_err = StorageError::SqliteError {
        message: "disk full".into(),
    };
    let err: RelkitError = storage_err.into();
    assert!(matches!(err, RelkitError::StorageError(_)));
    assert!(!err.is_unique_violation());
}

#[test]
fn unique_violation_is_detected() {
    let err: RelkitError = StorageError::UniqueViolation {
        message: "UNIQUE constraint failed: team.name".into(),
    }
    .into();
    assert!(err.is_unique_violation());
}

#[test]
fn consolidation_error_converts_to_relkit_error() {
    let err: RelkitError = ConsolidationError::MissingEntity {
        entity: EntityRef::new("person", 9),
    }
    .into();
    assert!(matches!(err, RelkitError::ConsolidationError(_)));
    assert!(err.to_string().contains("person#9"));
}

#[test]
fn schema_error_converts_to_relkit_error() {
    let err: RelkitError = SchemaError::UnknownType {
        name: "ghost".into(),
    }
    .into();
    assert!(matches!(err, RelkitError::SchemaError(_)));
}
