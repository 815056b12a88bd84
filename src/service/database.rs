//! Single-row lookup against a relational database, with a result cache

use crate::cache::{CacheKey, CacheStats, ResultCache};
use crate::config::DatabaseLookupConfig;
use crate::error::{LookupError, Result};
use crate::query::{QueryArgBinder, SelectQuery};
use crate::schema::{Record, RecordBuilder, SchemaInferencer, Value};
use crate::service::lifecycle::Lifecycle;
use crate::service::{key_coordinate, Coordinates, RecordLookup, ServiceState};
use crate::store::Database;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Runs `SELECT <columns|*> FROM <table> WHERE <clause>` with the `argN`
/// coordinates bound in position order and returns the first row
///
/// Rows are cached under `(table, key)`, where the key is the coordinate named
/// by [`DatabaseLookupConfig::key_name`]. A blank or missing key returns
/// `None` without touching the cache or the database.
pub struct DatabaseLookupService {
    database: Arc<dyn Database>,
    lifecycle: Lifecycle<Enabled>,
}

struct Enabled {
    config: DatabaseLookupConfig,
    statement: String,
    inferencer: SchemaInferencer,
    cache: Arc<ResultCache>,
}

impl DatabaseLookupService {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self {
            database,
            lifecycle: Lifecycle::new("DatabaseLookupService"),
        }
    }

    /// Validate `config`, check the database and start serving lookups
    ///
    /// When the service is already enabled its cached rows survive, unless
    /// `clear_on_enable` is set for a non-zero capacity or the cache sizing
    /// changed.
    pub async fn enable(&self, config: DatabaseLookupConfig) -> Result<()> {
        let database = Arc::clone(&self.database);
        self.lifecycle
            .enable(|previous| async move {
                config.validate()?;
                database.ping().await.map_err(|e| {
                    LookupError::InitializationError(format!("database unreachable: {}", e))
                })?;

                let cache = match previous {
                    Some(previous) if !needs_fresh_cache(&previous.cache, &config) => {
                        debug!("Keeping {} cached rows", previous.cache.len().await);
                        previous.cache
                    }
                    _ => Arc::new(ResultCache::new(config.cache.clone())),
                };

                let statement = SelectQuery::new(
                    config.table_name.as_str(),
                    config.value_columns.clone(),
                    config.where_clause.as_str(),
                )
                .render();
                info!("Lookup statement for {}: {}", config.table_name, statement);

                Ok(Enabled {
                    statement,
                    inferencer: SchemaInferencer::new(database.type_mapper()),
                    cache,
                    config,
                })
            })
            .await
    }

    pub async fn disable(&self) {
        self.lifecycle
            .disable(|enabled| async move {
                enabled.cache.clear().await;
            })
            .await
    }

    pub fn state(&self) -> ServiceState {
        self.lifecycle.state()
    }

    /// Result cache statistics of the enabled service
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        let enabled = self.lifecycle.read().await?;
        Ok(enabled.cache.stats().await)
    }

    async fn fetch(&self, enabled: &Enabled, args: &[(usize, Value)]) -> Result<Option<Record>> {
        let mut statement = self.database.prepare(&enabled.statement).await?;
        QueryArgBinder::bind_to(statement.as_mut(), args)?;

        let Some(row) = statement.fetch_first().await? else {
            return Ok(None);
        };

        let schema = Arc::new(enabled.inferencer.infer(&row, None)?);
        Ok(Some(RecordBuilder::build(&row, schema)))
    }
}

fn needs_fresh_cache(current: &ResultCache, config: &DatabaseLookupConfig) -> bool {
    let requested = &config.cache;
    let resized = current.config().capacity != requested.capacity
        || current.config().effective_ttl() != requested.effective_ttl();

    (requested.clear_on_enable && requested.is_enabled()) || resized
}

#[async_trait]
impl RecordLookup for DatabaseLookupService {
    fn required_keys(&self) -> HashSet<&'static str> {
        HashSet::new()
    }

    async fn lookup_with_context(
        &self,
        coordinates: &Coordinates,
        _context: &HashMap<String, String>,
    ) -> Result<Option<Record>> {
        let enabled = self.lifecycle.read().await?;

        let Some(key) = key_coordinate(coordinates, &enabled.config.key_name) else {
            return Ok(None);
        };
        let args = QueryArgBinder::extract(coordinates)?;

        let cache_key = CacheKey::new(enabled.config.table_name.as_str(), key.clone());
        if let Some(record) = enabled.cache.get(&cache_key).await {
            return Ok(Some(record));
        }

        let record = self
            .fetch(&enabled, &args)
            .await
            .map_err(|e| LookupError::StatementError {
                statement: enabled.statement.clone(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        if let Some(record) = &record {
            enabled.cache.put(cache_key, record.clone()).await;
        }
        Ok(record)
    }
}
