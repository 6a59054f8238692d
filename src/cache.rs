//! Bounded in-memory memoization for external API responses.
//!
//! Caching here is a performance nicety, not a correctness requirement:
//! entries are keyed by the exact argument tuple of a fetch, expire after a
//! TTL, and the whole cache is capped in size. Nothing survives the process.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

struct StoredEntry {
    value: Value,
    expires_at: Instant,
    inserted: u64,
}

/// TTL- and capacity-bounded response cache
pub struct MemoCache {
    ttl: Duration,
    capacity: usize,
    inner: Mutex<Inner>,
}

struct Inner {
    map: HashMap<String, StoredEntry>,
    seq: u64,
}

impl MemoCache {
    /// Create a cache holding at most `capacity` entries, each fresh for `ttl`
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                seq: 0,
            }),
        }
    }

    /// Retrieve a value if present and not expired
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        match inner.map.get(key) {
            Some(entry) if entry.expires_at > now => {
                tracing::debug!(key, "cache hit");
                return serde_json::from_value(entry.value.clone()).ok();
            }
            Some(_) => {
                tracing::debug!(key, "cache entry expired");
            }
            None => {
                tracing::debug!(key, "cache miss");
                return None;
            }
        }

        inner.map.remove(key);
        None
    }

    /// Store a value under `key`. Serialization failures only skip the store.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(key, "skipping cache store: {e}");
                return;
            }
        };

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        inner.map.retain(|_, entry| entry.expires_at > now);

        // At capacity: drop the oldest entry to make room
        if inner.map.len() >= self.capacity && !inner.map.contains_key(key) {
            if let Some(oldest) = inner
                .map
                .iter()
                .min_by_key(|(_, entry)| entry.inserted)
                .map(|(k, _)| k.clone())
            {
                inner.map.remove(&oldest);
            }
        }

        inner.seq += 1;
        let inserted = inner.seq;
        inner.map.insert(
            key.to_string(),
            StoredEntry {
                value,
                expires_at: now + self.ttl,
                inserted,
            },
        );
    }

    /// Number of entries currently held (expired entries included until swept)
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
