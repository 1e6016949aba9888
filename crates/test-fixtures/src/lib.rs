//! Test fixture loader: JSON schema definitions, text corpora, and seeding
//! helpers shared by integration tests across crates.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use relkit_core::entity::{Entity, Values};
use relkit_core::schema::{EntityTypeDef, SchemaRegistry};
use relkit_core::traits::IEntityStorage;
use relkit_storage::StorageEngine;

/// Root directory of the fixture data.
pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a fixture file as raw JSON Value.
pub fn load_fixture_value(relative_path: &str) -> Value {
    load_fixture(relative_path)
}

/// Build a registry from `schemas/<name>.json`.
pub fn load_schema(name: &str) -> Arc<SchemaRegistry> {
    let defs: Vec<EntityTypeDef> = load_fixture(&format!("schemas/{name}.json"));
    Arc::new(
        SchemaRegistry::build(defs)
            .unwrap_or_else(|e| panic!("Invalid fixture schema {name}: {e}")),
    )
}

/// Open an in-memory engine provisioned with `schemas/<name>.json`.
pub fn open_engine(schema_name: &str) -> StorageEngine {
    StorageEngine::open_in_memory(load_schema(schema_name))
        .unwrap_or_else(|e| panic!("Failed to open engine for {schema_name}: {e}"))
}

/// Text corpus from `corpus/<name>.json`.
pub fn load_corpus(name: &str) -> Vec<String> {
    load_fixture(&format!("corpus/{name}.json"))
}

/// Convert a `json!({...})` literal into a value map.
pub fn values(value: Value) -> Values {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Insert one entity, panicking on failure.
pub fn create(engine: &StorageEngine, entity_type: &str, value: Value) -> Entity {
    engine
        .create(entity_type, &values(value))
        .unwrap_or_else(|e| panic!("Failed to create {entity_type}: {e}"))
}

/// Seed the testapp schema: `n` second_test_model rows, each with one
/// test_model pointing at it. Texts come from the headlines corpus.
pub fn seed_testapp(engine: &StorageEngine, n: usize) -> (Vec<Entity>, Vec<Entity>) {
    let corpus = load_corpus("headlines");
    let mut firsts = Vec::with_capacity(n);
    let mut seconds = Vec::with_capacity(n);
    for i in 0..n {
        let text = corpus[i % corpus.len()].clone();
        let second = create(engine, "second_test_model", serde_json::json!({ "text_field": text }));
        let first = create(
            engine,
            "test_model",
            serde_json::json!({ "text_field": text, "second_related_object": second.pk }),
        );
        seconds.push(second);
        firsts.push(first);
    }
    (firsts, seconds)
}

/// Current row count of `entity_type`.
pub fn count(engine: &StorageEngine, entity_type: &str) -> usize {
    engine
        .count(entity_type, &relkit_core::Filter::all())
        .unwrap_or_else(|e| panic!("Failed to count {entity_type}: {e}"))
}
