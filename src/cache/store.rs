// Cache port and the in-memory cache store.
// Entries carry their own TTL and are treated as absent once expired.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Key/value store consulted around GET calls.
///
/// Keys are full request URLs including the query string. Implementations must
/// be shareable across tasks; the builders never lock around a miss-then-put.
pub trait CacheStore: Send + Sync {
    /// Retrieve a live entry, or `None` if absent or expired.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key` for `ttl`.
    fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<()>;

    /// Remove an entry. Returns whether one was present.
    fn forget(&self, key: &str) -> Result<bool>;

    /// Check whether a live entry exists.
    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub cached_at: DateTime<Utc>,
    /// Lifetime of the entry in seconds.
    pub ttl_secs: u64,
}

impl<T> CachedData<T> {
    /// Create a new cached data entry.
    pub fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
            ttl_secs: ttl.as_secs(),
        }
    }

    /// Check if this entry has outlived its TTL.
    pub fn is_expired(&self) -> bool {
        let elapsed = Utc::now()
            .signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        elapsed >= Duration::from_secs(self.ttl_secs)
    }

    /// Check if this entry is still valid (not expired).
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}

/// Process-local cache store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CachedData<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedData<Value>>> {
        // A poisoned map still holds consistent entries; keep serving it.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(cached) if cached.is_valid() => Ok(Some(cached.data.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        self.lock()
            .insert(key.to_string(), CachedData::new(value.clone(), ttl));
        Ok(())
    }

    fn forget(&self, key: &str) -> Result<bool> {
        Ok(self.lock().remove(key).is_some())
    }
}
