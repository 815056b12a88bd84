//! Query-then-fetch lookup against an object store

use crate::cache::SchemaCache;
use crate::config::SqlKeyLookupConfig;
use crate::error::{LookupError, Result};
use crate::query::{KeyQuery, QueryArgBinder};
use crate::schema::{Record, RecordBuilder, SchemaInferencer};
use crate::service::lifecycle::Lifecycle;
use crate::service::{correlation_token, Coordinates, RecordLookup, ServiceState};
use crate::store::ObjectStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Finds an object key with a where-clause query over `argN` coordinates,
/// then fetches the object under that key
///
/// Only the first matching key is used.
pub struct SqlKeyLookupService {
    store: Arc<dyn ObjectStore>,
    lifecycle: Lifecycle<Enabled>,
}

struct Enabled {
    config: SqlKeyLookupConfig,
    allowed: Option<HashSet<String>>,
    statement: String,
    result_column: String,
    schemas: SchemaCache,
}

impl SqlKeyLookupService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            lifecycle: Lifecycle::new("SqlKeyLookupService"),
        }
    }

    pub async fn enable(&self, config: SqlKeyLookupConfig) -> Result<()> {
        let store = Arc::clone(&self.store);
        self.lifecycle
            .enable(|_| async move {
                config.validate()?;
                store.ping().await.map_err(|e| {
                    LookupError::InitializationError(format!("object store unreachable: {}", e))
                })?;

                let query = KeyQuery::new(
                    config.cache_name.as_str(),
                    config.key_column.as_str(),
                    config.where_clause.as_str(),
                );
                let dialect = store.dialect();
                let statement = query.render(dialect);
                debug!("Key query: {}", statement);

                Ok(Enabled {
                    allowed: config.allowed_fields(),
                    statement,
                    result_column: query.result_column(dialect),
                    schemas: SchemaCache::new(SchemaInferencer::new(store.type_mapper())),
                    config,
                })
            })
            .await
    }

    pub async fn disable(&self) {
        self.lifecycle
            .disable(|enabled| async move { enabled.schemas.invalidate().await })
            .await
    }

    pub fn state(&self) -> ServiceState {
        self.lifecycle.state()
    }
}

#[async_trait]
impl RecordLookup for SqlKeyLookupService {
    fn required_keys(&self) -> HashSet<&'static str> {
        HashSet::new()
    }

    async fn lookup_with_context(
        &self,
        coordinates: &Coordinates,
        context: &HashMap<String, String>,
    ) -> Result<Option<Record>> {
        let enabled = self.lifecycle.read().await?;
        let args = QueryArgBinder::extract(coordinates)?;

        let keys = self
            .store
            .query_keys(&enabled.statement, &enabled.result_column, &args)
            .await?;
        let Some(key) = keys.into_iter().next() else {
            debug!("Key query matched nothing");
            return Ok(None);
        };

        let Some(object) = self.store.get(&enabled.config.cache_name, &key).await? else {
            debug!("Key {} matched but no object is stored under it", key);
            return Ok(None);
        };

        let schema = enabled
            .schemas
            .resolve(&object, enabled.allowed.as_ref(), correlation_token(context))
            .await?;

        Ok(Some(RecordBuilder::build(&object, schema)))
    }
}
