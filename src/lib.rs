//! # Record Lookup (record-lookup)
//!
//! Key-based record lookups over tagged-object stores and relational databases.
//!
//! ## Features
//!
//! - Schema inference from store type metadata, cached per correlation token
//! - Positional `argN` argument binding for lookup statements
//! - LRU result cache with a fixed per-entry lifetime
//! - Enable/disable lifecycle serialized against in-flight lookups
//! - Neo4j (neo4rs) and SQLite (sqlx) adapters
//!
//! ## Lookup Services
//!
//! ### Direct Key Lookup
//! Fetches the object stored under the `key` coordinate.
//!
//! ```no_run
//! use record_lookup::{Coordinates, KeyLookupConfig, KeyLookupService, Neo4jStore, Neo4jStoreConfig, RecordLookup};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Neo4jStore::connect(Neo4jStoreConfig::from_env()).await?;
//!
//!     let service = KeyLookupService::new(Arc::new(store));
//!     service.enable(KeyLookupConfig::new("Person").with_fields(["name", "age"])).await?;
//!
//!     let mut coordinates = Coordinates::new();
//!     coordinates.insert("key".to_string(), "alice".into());
//!
//!     if let Some(record) = service.lookup(&coordinates).await? {
//!         println!("Found: {}", record.to_json());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Query Key Lookup
//! Finds the key with a where-clause query, then fetches the object.
//!
//! ```no_run
//! use record_lookup::{Coordinates, Neo4jStore, Neo4jStoreConfig, RecordLookup, SqlKeyLookupConfig, SqlKeyLookupService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Neo4jStore::connect(Neo4jStoreConfig::from_env()).await?;
//!
//!     let service = SqlKeyLookupService::new(Arc::new(store));
//!     let config = SqlKeyLookupConfig::builder()
//!         .cache_name("Person")
//!         .key_column("key")
//!         .where_clause("n.email = $arg0")
//!         .build();
//!     service.enable(config).await?;
//!
//!     let mut coordinates = Coordinates::new();
//!     coordinates.insert("arg0".to_string(), "alice@example.com".into());
//!
//!     let record = service.lookup(&coordinates).await?;
//!     println!("Found: {:?}", record);
//!     Ok(())
//! }
//! ```
//!
//! ### Database Lookup
//! Selects one row, caching it under `(table, key)`.
//!
//! ```no_run
//! use record_lookup::{Coordinates, DatabaseLookupConfig, DatabaseLookupService, RecordLookup, ResultCacheConfig, SqliteDatabase};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let database = SqliteDatabase::connect("sqlite://lookup.db").await?;
//!
//!     let service = DatabaseLookupService::new(Arc::new(database));
//!     let config = DatabaseLookupConfig::builder()
//!         .table_name("T")
//!         .where_clause("id = ?")
//!         .cache(
//!             ResultCacheConfig::builder()
//!                 .capacity(1000)
//!                 .ttl(Duration::from_secs(300))
//!                 .build(),
//!         )
//!         .build();
//!     service.enable(config).await?;
//!
//!     let mut coordinates = Coordinates::new();
//!     coordinates.insert("key".to_string(), 1i64.into());
//!     coordinates.insert("arg0".to_string(), 1i64.into());
//!
//!     let record = service.lookup(&coordinates).await?;
//!     println!("Found: {:?}", record);
//!     println!("Cache: {}", service.cache_stats().await?);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod query;
pub mod schema;
pub mod service;
pub mod store;

// Re-export main types for convenience
pub use cache::{CacheKey, CacheStats, ResultCache, ResultCacheConfig, SchemaCache};
pub use config::{
    DatabaseLookupConfig, KeyLookupConfig, PropertyMap, SchemaPolicy, SqlKeyLookupConfig,
};
pub use error::{LookupError, Result};
pub use query::{KeyQuery, QueryArgBinder, QueryDialect, SelectQuery};
pub use schema::{
    DynamicObject, FieldType, Record, RecordField, RecordSchema, SchemaInferencer, TaggedObject,
    TypeMapper, Value,
};
pub use service::{
    Coordinates, DatabaseLookupService, KeyLookupService, RecordLookup, ServiceState,
    SqlKeyLookupService,
};
pub use store::{Database, Neo4jStore, Neo4jStoreConfig, ObjectStore, SqliteDatabase};
