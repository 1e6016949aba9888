//! Storage backends behind [`CacheHandler`](crate::CacheHandler).

pub mod file;
pub mod memory;

use std::time::Duration;

use serde_json::Value;

use relkit_core::errors::RelkitResult;

pub use file::FileBackend;
pub use memory::{MemoryBackend, SharedMemoryCache};

/// A place cached values live. Keys arrive already namespaced and hashed.
pub trait CacheBackend: Send + Sync {
    /// Store `value`. `None` keeps it until cleared, where the backend allows.
    fn write(&self, key: &str, value: Value, timeout: Option<Duration>) -> RelkitResult<()>;
    /// The live value under `key`. Expired values read as missing.
    fn read(&self, key: &str) -> RelkitResult<Option<Value>>;
    /// Drop everything this backend instance is responsible for; returns how
    /// many keys were removed.
    fn clear(&self) -> RelkitResult<usize>;
    fn clear_key(&self, key: &str) -> RelkitResult<()>;
}
