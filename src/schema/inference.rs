//! Schema inference and record materialization for tagged objects

use crate::error::{LookupError, Result};
use crate::schema::mapper::TypeMapper;
use crate::schema::object::TaggedObject;
use crate::schema::record::{Record, RecordField, RecordSchema};
use crate::schema::types::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Field name stores reserve for the back-reference of inner objects.
/// Never part of an inferred schema.
pub const SYNTHETIC_FIELD: &str = "this$0";

/// Derives a [`RecordSchema`] from a tagged object's type metadata
#[derive(Clone)]
pub struct SchemaInferencer {
    mapper: Arc<dyn TypeMapper>,
}

impl SchemaInferencer {
    pub fn new(mapper: Arc<dyn TypeMapper>) -> Self {
        Self { mapper }
    }

    /// Infer the schema of `object`
    ///
    /// Fields keep the store's enumeration order. When `allowed_fields` is set
    /// only those names are kept. One unmappable field fails the whole schema.
    pub fn infer(
        &self,
        object: &dyn TaggedObject,
        allowed_fields: Option<&HashSet<String>>,
    ) -> Result<RecordSchema> {
        let handle = object.type_handle();
        let mut fields = Vec::new();

        for name in handle.field_names() {
            if name == SYNTHETIC_FIELD {
                continue;
            }
            if let Some(allowed) = allowed_fields {
                if !allowed.contains(name) {
                    continue;
                }
            }

            let tag = handle.field_type_tag(name).unwrap_or_default();
            let field_type = self.mapper.map(tag).map_err(|e| match e {
                LookupError::UnsupportedType { tag, .. } => LookupError::UnsupportedType {
                    tag,
                    field: Some(name.to_string()),
                },
                other => other,
            })?;
            fields.push(RecordField::new(name, field_type));
        }

        let schema = RecordSchema::new(fields);
        debug!(
            "Inferred schema for type {}: {}",
            handle.type_name(),
            schema
        );
        Ok(schema)
    }
}

/// Materializes records from tagged objects
pub struct RecordBuilder;

impl RecordBuilder {
    /// Copy every schema field's value out of `object`; no coercion is applied
    pub fn build(object: &dyn TaggedObject, schema: Arc<RecordSchema>) -> Record {
        let values: HashMap<String, Value> = schema
            .fields()
            .iter()
            .map(|field| {
                let value = object.field(&field.name).unwrap_or(Value::Null);
                (field.name.clone(), value)
            })
            .collect();

        Record::new(schema, values)
    }
}
