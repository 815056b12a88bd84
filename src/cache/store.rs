//! Record cache with fixed-lifetime expiry and LRU eviction

use crate::cache::{
    config::ResultCacheConfig,
    entry::CacheEntry,
    types::{CacheKey, CacheStats},
};
use crate::schema::Record;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Capacity- and TTL-bounded cache of looked-up records
///
/// `get` never computes a missing record: callers fetch on a miss and `put`
/// the result themselves. An entry's expiry is fixed when the key is first
/// inserted; neither reads nor overwrites extend it. With a capacity of 0
/// every `get` misses and `put` does nothing.
pub struct ResultCache {
    config: ResultCacheConfig,

    /// Internal storage
    store: Arc<RwLock<CacheStore>>,
}

/// Internal cache storage
struct CacheStore {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry>,

    /// LRU tracking: front is least recently used
    lru_queue: VecDeque<CacheKey>,

    /// Current cache statistics
    stats: CacheStats,
}

impl CacheStore {
    fn remove_entry(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.lru_queue.retain(|k| k != key);
        self.stats.entries = self.entries.len();
        Some(entry)
    }

    fn touch(&mut self, key: &CacheKey) {
        self.lru_queue.retain(|k| k != key);
        self.lru_queue.push_back(key.clone());
    }

    fn purge_expired(&mut self) -> usize {
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }
        self.stats.evictions_ttl += expired.len() as u64;
        expired.len()
    }
}

impl ResultCache {
    /// Create a new cache with the given configuration
    pub fn new(config: ResultCacheConfig) -> Self {
        info!(
            "Initializing result cache (capacity: {}, ttl: {:?})",
            config.capacity,
            config.effective_ttl()
        );

        let store = CacheStore {
            entries: HashMap::new(),
            lru_queue: VecDeque::new(),
            stats: CacheStats::default(),
        };

        Self {
            config,
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub fn config(&self) -> &ResultCacheConfig {
        &self.config
    }

    /// Get a live record from the cache
    pub async fn get(&self, key: &CacheKey) -> Option<Record> {
        let mut guard = self.store.write().await;
        let store = &mut *guard;

        if !self.config.is_enabled() {
            store.stats.misses += 1;
            return None;
        }

        let expired = match store.entries.get(key) {
            None => {
                debug!("Cache miss: {}", key);
                store.stats.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            store.remove_entry(key);
            store.stats.misses += 1;
            store.stats.evictions_ttl += 1;
            return None;
        }

        let record = match store.entries.get_mut(key) {
            Some(entry) => {
                entry.mark_accessed();
                entry.record.clone()
            }
            None => return None,
        };
        store.touch(key);
        store.stats.hits += 1;

        debug!("Cache hit: {}", key);
        Some(record)
    }

    /// Insert or overwrite a record
    pub async fn put(&self, key: CacheKey, record: Record) {
        if !self.config.is_enabled() {
            return;
        }

        let mut guard = self.store.write().await;
        let store = &mut *guard;

        let live = store
            .entries
            .get(&key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false);

        if live {
            debug!("Updating existing cache entry: {}", key);
            if let Some(existing) = store.entries.get_mut(&key) {
                existing.replace_record(record);
            }
            store.touch(&key);
            return;
        }

        // A dead entry under the same key starts over with a fresh lifetime
        if store.remove_entry(&key).is_some() {
            store.stats.evictions_ttl += 1;
        }

        if store.entries.len() >= self.config.capacity {
            store.purge_expired();
        }
        while store.entries.len() >= self.config.capacity {
            match store.lru_queue.pop_front() {
                Some(victim) => {
                    debug!("Evicting entry due to capacity limit: {}", victim);
                    store.entries.remove(&victim);
                    store.stats.evictions_capacity += 1;
                }
                None => break,
            }
        }

        debug!("Inserting new cache entry: {}", key);
        let entry = CacheEntry::new(key.clone(), record, self.config.effective_ttl());
        store.entries.insert(key.clone(), entry);
        store.lru_queue.push_back(key);
        store.stats.entries = store.entries.len();
    }

    /// Remove a specific entry from the cache
    pub async fn remove(&self, key: &CacheKey) -> Option<Record> {
        let mut store = self.store.write().await;
        let entry = store.remove_entry(key)?;
        store.stats.invalidations += 1;
        debug!("Removed cache entry: {}", key);
        Some(entry.record)
    }

    /// Clear all entries from the cache
    pub async fn clear(&self) -> usize {
        let mut store = self.store.write().await;

        let count = store.entries.len();
        store.entries.clear();
        store.lru_queue.clear();
        store.stats.entries = 0;
        store.stats.invalidations += count as u64;

        info!("Cleared {} entries from result cache", count);
        count
    }

    /// Remove all expired entries, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let mut store = self.store.write().await;
        let removed = store.purge_expired();
        if removed > 0 {
            debug!("Cleaned up {} expired entries", removed);
        }
        removed
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        store.stats.clone()
    }

    /// Get number of entries in cache, expired ones included until purged
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        let store = self.store.read().await;
        store.entries.is_empty()
    }
}
