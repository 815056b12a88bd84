//! Configuration for the result cache

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`ResultCache`](crate::cache::ResultCache)
///
/// A capacity of 0 disables caching. A missing or zero TTL means entries only
/// leave the cache through LRU eviction or a clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCacheConfig {
    /// Maximum number of cached records
    pub capacity: usize,

    /// Lifetime of an entry, fixed when it is first inserted
    pub ttl: Option<Duration>,

    /// Drop cached records when the owning service is enabled again
    pub clear_on_enable: bool,
}

impl Default for ResultCacheConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            ttl: None,
            clear_on_enable: true,
        }
    }
}

impl ResultCacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> ResultCacheConfigBuilder {
        ResultCacheConfigBuilder::default()
    }

    /// Configuration with caching switched off
    pub fn disabled() -> Self {
        Self::default()
    }

    /// LRU-only cache holding at most `capacity` records
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// TTL with a zero duration treated as "no expiry"
    pub fn effective_ttl(&self) -> Option<Duration> {
        self.ttl.filter(|ttl| !ttl.is_zero())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ttl) = self.effective_ttl() {
            if chrono::Duration::from_std(ttl).is_err() {
                return Err(format!("cache expiration {:?} is out of range", ttl));
            }
        }

        Ok(())
    }
}

/// Builder for result cache configuration
#[derive(Debug, Default)]
pub struct ResultCacheConfigBuilder {
    capacity: Option<usize>,
    ttl: Option<Duration>,
    clear_on_enable: Option<bool>,
}

impl ResultCacheConfigBuilder {
    /// Set the maximum number of cached records
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the fixed entry lifetime
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Enable or disable clearing on re-enable
    pub fn clear_on_enable(mut self, clear: bool) -> Self {
        self.clear_on_enable = Some(clear);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> ResultCacheConfig {
        let defaults = ResultCacheConfig::default();

        ResultCacheConfig {
            capacity: self.capacity.unwrap_or(defaults.capacity),
            ttl: self.ttl.or(defaults.ttl),
            clear_on_enable: self.clear_on_enable.unwrap_or(defaults.clear_on_enable),
        }
    }
}
