//! CacheHandler over both backends.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use relkit_cache::{hash_key, CacheHandler, SharedMemoryCache};
use relkit_core::config::CacheConfig;
use relkit_core::errors::RelkitError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Report {
    title: String,
    rows: Vec<u32>,
}

fn report() -> Report {
    Report {
        title: "daily".to_string(),
        rows: vec![3, 1, 4],
    }
}

// --- memory backend ---

#[test]
fn memory_round_trips_typed_values() {
    let cache = CacheHandler::memory("reports", &CacheConfig::default());
    cache.write("today", &report(), None).unwrap();

    assert_eq!(cache.read::<Report>("today").unwrap(), Some(report()));
    assert_eq!(cache.read::<Report>("yesterday").unwrap(), None);
}

#[test]
fn memory_timeouts_expire() {
    let cache = CacheHandler::memory("reports", &CacheConfig::default());
    cache.write("brief", &1u32, Some(Duration::from_millis(20))).unwrap();
    std::thread::sleep(Duration::from_millis(80));
    assert_eq!(cache.read::<u32>("brief").unwrap(), None);
}

#[test]
fn clear_key_and_clear() {
    let cache = CacheHandler::memory("reports", &CacheConfig::default());
    cache.write("a", "x", None).unwrap();
    cache.write("b", "y", None).unwrap();

    cache.clear_key("a").unwrap();
    assert_eq!(cache.read::<String>("a").unwrap(), None);
    assert_eq!(cache.read::<String>("b").unwrap().as_deref(), Some("y"));

    cache.clear().unwrap();
    assert_eq!(cache.read::<String>("b").unwrap(), None);
}

#[test]
fn shared_memory_clear_is_scoped_to_the_handler() {
    let shared = SharedMemoryCache::new(1_000);
    let config = CacheConfig::default();
    let reports = CacheHandler::shared_memory("reports", &shared, &config);
    let exports = CacheHandler::shared_memory("exports", &shared, &config);
    reports.write("k", &1u32, None).unwrap();
    exports.write("k", &2u32, None).unwrap();

    reports.clear().unwrap();
    assert_eq!(reports.read::<u32>("k").unwrap(), None);
    assert_eq!(exports.read::<u32>("k").unwrap(), Some(2));
}

#[test]
fn wrong_type_is_a_serialization_error() {
    let cache = CacheHandler::memory("reports", &CacheConfig::default());
    cache.write("today", &report(), None).unwrap();
    let err = cache.read::<u32>("today").unwrap_err();
    assert!(matches!(err, RelkitError::SerializationError(_)));
}

// --- file backend ---

#[test]
fn file_values_survive_a_new_handler() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig::default();

    CacheHandler::file(dir.path(), &config)
        .unwrap()
        .write("today", &report(), None)
        .unwrap();
    let reopened = CacheHandler::file(dir.path(), &config).unwrap();
    assert_eq!(reopened.read::<Report>("today").unwrap(), Some(report()));
}

#[test]
fn file_without_timeout_does_not_expire() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheHandler::file(dir.path(), &CacheConfig::default()).unwrap();
    cache.write("forever", &7u32, None).unwrap();
    cache.write("brief", &8u32, Some(Duration::from_millis(10))).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    assert_eq!(cache.read::<u32>("forever").unwrap(), Some(7));
    assert_eq!(cache.read::<u32>("brief").unwrap(), None);
}

#[test]
fn hashed_keys_allow_any_text() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        hash_keys: true,
        ..CacheConfig::default()
    };
    let cache = CacheHandler::file(dir.path(), &config).unwrap();
    cache.write("reports/2024 q1", &1u32, None).unwrap();

    assert!(dir.path().join(format!("{}.json", hash_key("reports/2024 q1"))).exists());
    assert_eq!(cache.read::<u32>("reports/2024 q1").unwrap(), Some(1));
}

#[test]
fn unhashed_path_keys_are_rejected_by_files() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheHandler::file(dir.path(), &CacheConfig::default()).unwrap();
    let err = cache.write("a/b", &1u32, None).unwrap_err();
    assert!(matches!(err, RelkitError::CacheError { .. }));
}

// --- config ---

#[test]
fn config_selects_the_backend() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        file_dir: Some(dir.path().display().to_string()),
        ..CacheConfig::default()
    };
    let cache = CacheHandler::from_config("reports", &config).unwrap();
    cache.write("today", &report(), None).unwrap();
    assert!(dir.path().join("reports").join("today.json").exists());

    let memory = CacheHandler::from_config("reports", &CacheConfig::default()).unwrap();
    assert_eq!(memory.namespace(), "reports");
    assert_eq!(memory.read::<Report>("today").unwrap(), None);
}
