//! File backend: one JSON file per key under a directory.
//!
//! Each file holds the value and its expiry time. Values written without a
//! timeout never expire. An expired file is removed when read.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use relkit_core::errors::{RelkitError, RelkitResult};
use relkit_observability::events;

use super::CacheBackend;

const EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredValue {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Back the cache with `dir`, creating it if missing.
    pub fn open(dir: impl Into<PathBuf>) -> RelkitResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> RelkitResult<PathBuf> {
        let unsafe_name = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', '\0']);
        if unsafe_name {
            return Err(RelkitError::CacheError {
                reason: format!("key {key:?} is not a valid file name; enable key hashing"),
            });
        }
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }

    fn namespace(&self) -> String {
        self.dir.display().to_string()
    }
}

impl CacheBackend for FileBackend {
    fn write(&self, key: &str, value: Value, timeout: Option<Duration>) -> RelkitResult<()> {
        let path = self.path_for(key)?;
        let expires_at = match timeout {
            Some(timeout) => {
                let timeout =
                    chrono::Duration::from_std(timeout).map_err(|e| RelkitError::CacheError {
                        reason: format!("timeout out of range: {e}"),
                    })?;
                Some(Utc::now() + timeout)
            }
            None => None,
        };
        let body = serde_json::to_vec(&StoredValue { value, expires_at })?;
        fs::write(&path, body).map_err(|e| io_error(&path, e))
    }

    fn read(&self, key: &str) -> RelkitResult<Option<Value>> {
        let path = self.path_for(key)?;
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };
        let stored: StoredValue = serde_json::from_slice(&body)?;
        match stored.expires_at {
            Some(expires_at) if expires_at < Utc::now() => {
                events::cache_entry_expired(&self.namespace(), key);
                self.clear_key(key)?;
                Ok(None)
            }
            _ => Ok(Some(stored.value)),
        }
    }

    fn clear(&self) -> RelkitResult<usize> {
        let entries = fs::read_dir(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let mut removed = 0;
        for entry in entries {
            let path = entry.map_err(|e| io_error(&self.dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION) {
                fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn clear_key(&self, key: &str) -> RelkitResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

fn io_error(path: &Path, e: std::io::Error) -> RelkitError {
    RelkitError::CacheError {
        reason: format!("{}: {e}", path.display()),
    }
}
