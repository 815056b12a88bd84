//! Direct key lookup against an object store

use crate::cache::SchemaCache;
use crate::config::{KeyLookupConfig, SchemaPolicy};
use crate::error::{LookupError, Result};
use crate::schema::{Record, RecordBuilder, SchemaInferencer};
use crate::service::lifecycle::Lifecycle;
use crate::service::{
    correlation_token, key_coordinate, Coordinates, RecordLookup, ServiceState, KEY_COORDINATE,
};
use crate::store::ObjectStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Looks up the object stored under `coordinates["key"]` and returns it as a
/// record
pub struct KeyLookupService {
    store: Arc<dyn ObjectStore>,
    lifecycle: Lifecycle<Enabled>,
}

struct Enabled {
    config: KeyLookupConfig,
    allowed: Option<HashSet<String>>,
    inferencer: SchemaInferencer,
    schemas: SchemaCache,
}

impl KeyLookupService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            lifecycle: Lifecycle::new("KeyLookupService"),
        }
    }

    /// Validate `config`, check the store and start serving lookups
    ///
    /// Re-enabling replaces the configuration and drops the cached schema.
    pub async fn enable(&self, config: KeyLookupConfig) -> Result<()> {
        let store = Arc::clone(&self.store);
        self.lifecycle
            .enable(|_| async move {
                config.validate()?;
                store.ping().await.map_err(|e| {
                    LookupError::InitializationError(format!("object store unreachable: {}", e))
                })?;

                let inferencer = SchemaInferencer::new(store.type_mapper());
                Ok(Enabled {
                    allowed: config.allowed_fields(),
                    schemas: SchemaCache::new(inferencer.clone()),
                    inferencer,
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
impl RecordLookup for KeyLookupService {
    fn required_keys(&self) -> HashSet<&'static str> {
        HashSet::from([KEY_COORDINATE])
    }

    async fn lookup_with_context(
        &self,
        coordinates: &Coordinates,
        context: &HashMap<String, String>,
    ) -> Result<Option<Record>> {
        let enabled = self.lifecycle.read().await?;

        let Some(key) = key_coordinate(coordinates, KEY_COORDINATE) else {
            return Ok(None);
        };

        let Some(object) = self.store.get(&enabled.config.cache_name, key).await? else {
            debug!("No object under {} in {}", key, enabled.config.cache_name);
            return Ok(None);
        };

        let schema = match enabled.config.schema_policy {
            SchemaPolicy::PerCorrelation => {
                enabled
                    .schemas
                    .resolve(&object, enabled.allowed.as_ref(), correlation_token(context))
                    .await?
            }
            SchemaPolicy::PerLookup => Arc::new(enabled.inferencer.infer(&object, None)?),
        };

        Ok(Some(RecordBuilder::build(&object, schema)))
    }
}
