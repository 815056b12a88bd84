//! Cache entry management with fixed-lifetime expiry

use crate::cache::types::CacheKey;
use crate::schema::Record;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A cached record with its expiry metadata
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    /// The cached record
    pub record: Record,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

impl CacheEntry {
    /// Create a new entry; with a TTL the expiry is fixed at `now + ttl`
    pub fn new(key: CacheKey, record: Record, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        let expires_at = ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok().map(|d| now + d));

        Self {
            key,
            record,
            metadata: CacheMetadata {
                created_at: now,
                accessed_at: now,
                expires_at,
                access_count: 0,
                version: 1,
            },
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        match self.metadata.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }

    /// Get time until expiration, `None` if expired or never expiring
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let expires_at = self.metadata.expires_at?;
        (expires_at - Utc::now()).to_std().ok()
    }

    /// Mark the entry as accessed. Does not touch the expiry.
    pub fn mark_accessed(&mut self) {
        self.metadata.accessed_at = Utc::now();
        self.metadata.access_count += 1;
    }

    /// Replace the record, keeping the original expiry
    pub fn replace_record(&mut self, record: Record) {
        self.record = record;
        self.metadata.version += 1;
    }
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone)]
pub struct CacheMetadata {
    /// When the entry was created
    pub created_at: DateTime<Utc>,

    /// Last access time
    pub accessed_at: DateTime<Utc>,

    /// When the entry expires, if ever
    pub expires_at: Option<DateTime<Utc>>,

    /// Number of times this entry has been read
    pub access_count: u64,

    /// Version number (incremented on updates)
    pub version: u64,
}
