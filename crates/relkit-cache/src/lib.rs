//! # relkit-cache
//!
//! A small key-value cache for expensive results. [`CacheHandler`] serializes
//! values to JSON and hands them to a backend: moka in memory, or one file
//! per key on disk.

pub mod backends;
pub mod handler;

pub use backends::{CacheBackend, FileBackend, MemoryBackend, SharedMemoryCache};
pub use handler::{hash_key, CacheHandler};
