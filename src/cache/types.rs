//! Core type definitions for the cache system

use crate::schema::Value;
use serde::Serialize;
use std::fmt;

/// Composite cache key: the scope the record came from plus the lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
    /// Table or cache name
    pub scope: String,

    /// Logical lookup key
    pub key: Value,
}

impl CacheKey {
    pub fn new(scope: impl Into<String>, key: Value) -> Self {
        Self {
            scope: scope.into(),
            key,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.key)
    }
}

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of cache hits
    pub hits: u64,

    /// Total number of cache misses
    pub misses: u64,

    /// Number of entries currently in cache
    pub entries: usize,

    /// Number of evictions due to the capacity bound
    pub evictions_capacity: u64,

    /// Number of evictions due to TTL expiration
    pub evictions_ttl: u64,

    /// Number of entries dropped by clear or remove
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate total evictions
    pub fn total_evictions(&self) -> u64 {
        self.evictions_capacity + self.evictions_ttl
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, entries: {}, evictions: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.entries,
            self.total_evictions()
        )
    }
}
