//! # Lookup Caches
//!
//! Two caches sit in front of the backing stores:
//!
//! - [`ResultCache`]: capacity- and TTL-bounded map from `(scope, key)` to a
//!   materialized record. Expiry is fixed at insertion, eviction is LRU, and a
//!   capacity of 0 turns it off.
//! - [`SchemaCache`]: one inferred schema, kept until the caller's correlation
//!   token changes.
//!
//! ## Example
//!
//! ```rust
//! use record_lookup::cache::{CacheKey, ResultCache, ResultCacheConfig};
//! use record_lookup::schema::{Record, RecordSchema, Value};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ResultCacheConfig::builder()
//!     .capacity(1_000)
//!     .ttl(Duration::from_secs(300))
//!     .build();
//!
//! let cache = ResultCache::new(config);
//! let key = CacheKey::new("customers", Value::from(42i64));
//!
//! if cache.get(&key).await.is_none() {
//!     let record = Record::new(Arc::new(RecordSchema::new(Vec::new())), HashMap::new());
//!     cache.put(key.clone(), record).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod schema;
pub mod store;
pub mod types;

pub use config::{ResultCacheConfig, ResultCacheConfigBuilder};
pub use entry::{CacheEntry, CacheMetadata};
pub use schema::SchemaCache;
pub use store::ResultCache;
pub use types::{CacheKey, CacheStats};
