//! `CacheHandler`: typed reads and writes over a [`CacheBackend`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use relkit_core::config::CacheConfig;
use relkit_core::errors::RelkitResult;
use relkit_observability::events;

use crate::backends::{CacheBackend, FileBackend, MemoryBackend, SharedMemoryCache};

/// A namespaced cache. Values are stored as JSON.
pub struct CacheHandler {
    namespace: String,
    hash_keys: bool,
    backend: Box<dyn CacheBackend>,
}

impl CacheHandler {
    /// In-memory cache private to this handler.
    pub fn memory(namespace: impl Into<String>, config: &CacheConfig) -> Self {
        let namespace = namespace.into();
        let backend = MemoryBackend::new(
            namespace.clone(),
            config.max_capacity,
            Duration::from_secs(config.default_timeout_secs),
        );
        Self::with_backend(namespace, config.hash_keys, Box::new(backend))
    }

    /// In-memory cache sharing storage with other handlers. `clear` only
    /// removes what this handler wrote.
    pub fn shared_memory(
        namespace: impl Into<String>,
        cache: &SharedMemoryCache,
        config: &CacheConfig,
    ) -> Self {
        let namespace = namespace.into();
        let backend = MemoryBackend::shared(
            cache.clone(),
            namespace.clone(),
            Duration::from_secs(config.default_timeout_secs),
        );
        Self::with_backend(namespace, config.hash_keys, Box::new(backend))
    }

    /// File cache rooted at `dir`.
    pub fn file(dir: impl Into<std::path::PathBuf>, config: &CacheConfig) -> RelkitResult<Self> {
        let backend = FileBackend::open(dir)?;
        let namespace = backend.dir().display().to_string();
        Ok(Self::with_backend(namespace, config.hash_keys, Box::new(backend)))
    }

    /// File cache when `config.file_dir` is set, in-memory otherwise.
    pub fn from_config(namespace: impl Into<String>, config: &CacheConfig) -> RelkitResult<Self> {
        match &config.file_dir {
            Some(dir) => Self::file(std::path::Path::new(dir).join(namespace.into()), config),
            None => Ok(Self::memory(namespace, config)),
        }
    }

    pub fn with_backend(
        namespace: impl Into<String>,
        hash_keys: bool,
        backend: Box<dyn CacheBackend>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            hash_keys,
            backend,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Store `value` under `key`. Without a timeout the in-memory backend
    /// uses its default and the file backend keeps the value until cleared.
    pub fn write<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        timeout: Option<Duration>,
    ) -> RelkitResult<()> {
        let value = serde_json::to_value(value)?;
        self.backend.write(&self.storage_key(key), value, timeout)
    }

    /// The value under `key`, or `None` when missing or expired.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> RelkitResult<Option<T>> {
        match self.backend.read(&self.storage_key(key))? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn clear(&self) -> RelkitResult<()> {
        let removed = self.backend.clear()?;
        events::cache_cleared(&self.namespace, removed);
        Ok(())
    }

    pub fn clear_key(&self, key: &str) -> RelkitResult<()> {
        self.backend.clear_key(&self.storage_key(key))
    }

    fn storage_key(&self, key: &str) -> String {
        if self.hash_keys {
            hash_key(key)
        } else {
            key.to_string()
        }
    }
}

/// Hex blake3 digest of `key`.
pub fn hash_key(key: &str) -> String {
    blake3::hash(key.as_bytes()).to_hex().to_string()
}
