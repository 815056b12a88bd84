//! Single-slot schema cache scoped by a correlation token

use crate::error::Result;
use crate::schema::{RecordSchema, SchemaInferencer, TaggedObject};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Holds the last inferred schema until the correlation token changes
///
/// All lookups carrying the same token are assumed to see objects of one
/// shape. Two shapes under one token share the first schema; the cache does
/// not fingerprint object types.
pub struct SchemaCache {
    inferencer: SchemaInferencer,
    slot: Mutex<SchemaSlot>,
}

#[derive(Default)]
struct SchemaSlot {
    schema: Option<Arc<RecordSchema>>,
    last_token: Option<String>,
}

impl SchemaCache {
    pub fn new(inferencer: SchemaInferencer) -> Self {
        Self {
            inferencer,
            slot: Mutex::new(SchemaSlot::default()),
        }
    }

    /// Return the cached schema, inferring it from `object` when the slot is
    /// empty or `token` differs from the last token seen.
    ///
    /// A call without a token never invalidates the slot.
    pub async fn resolve(
        &self,
        object: &dyn TaggedObject,
        allowed_fields: Option<&HashSet<String>>,
        token: Option<&str>,
    ) -> Result<Arc<RecordSchema>> {
        let mut slot = self.slot.lock().await;

        if let Some(token) = token {
            if slot.last_token.as_deref() != Some(token) {
                if slot.last_token.is_some() && slot.schema.is_some() {
                    debug!("Correlation token changed, dropping cached schema");
                }
                slot.schema = None;
                slot.last_token = Some(token.to_string());
            }
        }

        if let Some(schema) = &slot.schema {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(self.inferencer.infer(object, allowed_fields)?);
        slot.schema = Some(Arc::clone(&schema));
        Ok(schema)
    }

    /// Drop the cached schema and forget the last token
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        slot.schema = None;
        slot.last_token = None;
    }

    /// Currently cached schema, if any
    pub async fn cached(&self) -> Option<Arc<RecordSchema>> {
        self.slot.lock().await.schema.clone()
    }
}
