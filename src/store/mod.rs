//! Backing store contracts and their adapters
//!
//! The lookup services talk to two kinds of collaborators:
//!
//! - an [`ObjectStore`] holding tagged objects under keys, queryable for keys;
//! - a relational [`Database`] whose statements yield at most one row here.
//!
//! Both are shared handles. Services borrow them per lookup and never lock them.

pub mod neo4j;
pub mod sql;

use crate::error::Result;
use crate::query::QueryDialect;
use crate::schema::{DynamicObject, TypeMapper, Value};
use async_trait::async_trait;
use std::sync::Arc;

pub use neo4j::{BoltTypeMapper, Neo4jStore, Neo4jStoreConfig};
pub use sql::{SqlTypeMapper, SqliteDatabase};

/// Key/tagged-object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Cheap round trip used when a service is enabled
    async fn ping(&self) -> Result<()>;

    /// Mapper for the type tags this store puts on its objects
    fn type_mapper(&self) -> Arc<dyn TypeMapper>;

    /// Statement language accepted by [`query_keys`](Self::query_keys)
    fn dialect(&self) -> QueryDialect;

    /// Fetch the object stored under `key` in `scope` (cache, label, ...)
    async fn get(&self, scope: &str, key: &Value) -> Result<Option<DynamicObject>>;

    /// Run `statement` with positional `args` and return the `key_column`
    /// value of every row, in result order
    async fn query_keys(
        &self,
        statement: &str,
        key_column: &str,
        args: &[(usize, Value)],
    ) -> Result<Vec<Value>>;
}

/// Relational database handle
#[async_trait]
pub trait Database: Send + Sync {
    /// Cheap round trip used when a service is enabled
    async fn ping(&self) -> Result<()>;

    /// Mapper for the column type names this database reports
    fn type_mapper(&self) -> Arc<dyn TypeMapper>;

    async fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedQuery>>;
}

/// A statement awaiting its arguments
#[async_trait]
pub trait PreparedQuery: Send {
    /// Bind `value` to the 1-based parameter slot `position`
    fn bind(&mut self, position: usize, value: &Value) -> Result<()>;

    /// Execute and return the first row; remaining rows are discarded
    async fn fetch_first(self: Box<Self>) -> Result<Option<DynamicObject>>;
}
