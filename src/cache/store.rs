//! In-process cache storage.
//!
//! Entries are opaque bytes with an absolute expiry. Expired entries are
//! dropped lazily on access; capacity pressure evicts the least recently used.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use super::lock::{rw_read, rw_write};
use super::{CacheError, EntityCache};

const SOURCE: &str = "cache::store";

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// LRU-bounded map of serialized snapshots keyed by string.
pub struct MemoryCache {
    entries: RwLock<LruCache<String, Entry>>,
}

impl MemoryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Number of stored entries, expired ones included until touched.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let hit = entries
            .get(key)
            .map(|entry| (!entry.is_expired(now)).then(|| entry.value.clone()));
        match hit {
            Some(Some(value)) => Some(value),
            Some(None) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    fn insert(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::TtlOutOfRange {
                key: key.to_string(),
                seconds: ttl.as_secs(),
            })?;
        let mut entries = rw_write(&self.entries, SOURCE, "set");
        let evicted = entries.push(key.to_string(), Entry { value, expires_at });
        if matches!(&evicted, Some((evicted_key, _)) if evicted_key != key) {
            counter!("blogo_cache_evict_total").increment(1);
        }
        Ok(())
    }

    fn remove_prefix(&self, prefix: &str) -> u64 {
        let mut entries = rw_write(&self.entries, SOURCE, "delete_by_prefix");
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len() as u64
    }
}

#[async_trait]
impl EntityCache for MemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        Ok(self.lookup(key))
    }

    async fn set_raw(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        self.insert(key, value, ttl)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "delete").pop(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        Ok(self.remove_prefix(prefix))
    }
}
