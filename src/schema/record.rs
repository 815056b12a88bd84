//! Record schemas and materialized records

use crate::schema::types::{FieldType, Value};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A named, typed field of a record schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordField {
    pub name: String,
    pub field_type: FieldType,
}

impl RecordField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered sequence of uniquely named fields
///
/// Schemas are immutable once built and shared between records through `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSchema {
    fields: Vec<RecordField>,
}

impl RecordSchema {
    /// Build a schema, keeping the first occurrence of a repeated field name
    pub fn new(fields: Vec<RecordField>) -> Self {
        let mut unique: Vec<RecordField> = Vec::with_capacity(fields.len());
        for field in fields {
            if !unique.iter().any(|f| f.name == field.name) {
                unique.push(field);
            }
        }
        Self { fields: unique }
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("{}: {}", field.name, field.field_type))
            .collect();
        write!(f, "[{}]", fields.join(", "))
    }
}

/// A schema plus one value per schema field
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<RecordSchema>,
    values: HashMap<String, Value>,
}

impl Record {
    pub fn new(schema: Arc<RecordSchema>, values: HashMap<String, Value>) -> Self {
        Self { schema, values }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// True when every non-null value matches the type its field declares
    pub fn conforms(&self) -> bool {
        self.schema.fields().iter().all(|field| {
            match self.values.get(&field.name).and_then(Value::field_type) {
                Some(actual) => actual == field.field_type,
                None => true,
            }
        })
    }

    /// JSON object in schema field order
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for field in self.schema.fields() {
            let value = self.values.get(&field.name).unwrap_or(&Value::Null);
            map.insert(
                field.name.clone(),
                serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
            );
        }
        serde_json::Value::Object(map)
    }
}
