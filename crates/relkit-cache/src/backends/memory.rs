//! In-memory backend on moka with a timeout per entry.
//!
//! One [`SharedMemoryCache`] can back several handlers. Each backend stores
//! its keys under `<namespace>/`, tracks the keys it wrote, and `clear` only
//! invalidates those.

use std::time::{Duration, Instant};

use dashmap::DashSet;
use moka::sync::Cache;
use moka::Expiry;
use serde_json::Value;

use relkit_core::errors::RelkitResult;

use super::CacheBackend;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    timeout: Duration,
}

/// Expires each entry after the timeout it was written with.
struct PerEntryTimeout;

impl Expiry<String, Entry> for PerEntryTimeout {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.timeout)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.timeout)
    }
}

/// A moka cache that several [`MemoryBackend`]s may share. Cloning is cheap.
#[derive(Clone)]
pub struct SharedMemoryCache {
    inner: Cache<String, Entry>,
}

impl SharedMemoryCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTimeout)
            .build();
        Self { inner }
    }

    /// Whether a live entry exists under the full `<namespace>/<key>`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}

pub struct MemoryBackend {
    cache: SharedMemoryCache,
    namespace: String,
    written: DashSet<String>,
    default_timeout: Duration,
}

impl MemoryBackend {
    /// A backend with a private cache.
    pub fn new(namespace: impl Into<String>, max_capacity: u64, default_timeout: Duration) -> Self {
        Self::shared(SharedMemoryCache::new(max_capacity), namespace, default_timeout)
    }

    pub fn shared(
        cache: SharedMemoryCache,
        namespace: impl Into<String>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            namespace: namespace.into(),
            written: DashSet::new(),
            default_timeout,
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}/{}", self.namespace, key)
    }

    /// Keys this backend has written and not cleared.
    pub fn tracked_keys(&self) -> usize {
        self.written.len()
    }
}

impl CacheBackend for MemoryBackend {
    fn write(&self, key: &str, value: Value, timeout: Option<Duration>) -> RelkitResult<()> {
        let timeout = timeout.unwrap_or_else(|| {
            tracing::debug!(
                key,
                default_secs = self.default_timeout.as_secs(),
                "no timeout given for in-memory cache entry, using default"
            );
            self.default_timeout
        });
        let key = self.full_key(key);
        self.written.insert(key.clone());
        self.cache.inner.insert(key, Entry { value, timeout });
        Ok(())
    }

    fn read(&self, key: &str) -> RelkitResult<Option<Value>> {
        Ok(self.cache.inner.get(&self.full_key(key)).map(|entry| entry.value))
    }

    fn clear(&self) -> RelkitResult<usize> {
        let keys: Vec<String> = self.written.iter().map(|k| k.key().clone()).collect();
        for key in &keys {
            self.cache.inner.invalidate(key);
            self.written.remove(key);
        }
        Ok(keys.len())
    }

    fn clear_key(&self, key: &str) -> RelkitResult<()> {
        let key = self.full_key(key);
        self.cache.inner.invalidate(&key);
        self.written.remove(&key);
        Ok(())
    }
}
