//! Tagged objects: values whose shape is only known through runtime type metadata

use crate::schema::types::Value;
use std::collections::HashMap;

/// Runtime type metadata of a tagged object
pub trait TypeIntrospectable: Send + Sync {
    /// Name of the type as the store reports it
    fn type_name(&self) -> &str;

    /// Field names, in the store's enumeration order
    fn field_names(&self) -> Vec<&str>;

    /// Store-specific type tag of a field
    fn field_type_tag(&self, name: &str) -> Option<&str>;
}

/// Read-only view of an object returned by a backing store
pub trait TaggedObject: Send + Sync {
    fn type_handle(&self) -> &dyn TypeIntrospectable;

    fn field(&self, name: &str) -> Option<Value>;
}

/// Owned type handle: type name plus `(field, tag)` pairs in order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectType {
    name: String,
    fields: Vec<(String, String)>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }
}

impl TypeIntrospectable for ObjectType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn field_type_tag(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, tag)| tag.as_str())
    }
}

/// Store-agnostic tagged object produced by the store adapters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicObject {
    object_type: ObjectType,
    values: HashMap<String, Value>,
}

impl DynamicObject {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            object_type: ObjectType::new(type_name),
            values: HashMap::new(),
        }
    }

    /// Add a field, replacing the tag and value if the name is already present
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        tag: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.set_field(name, tag, value);
        self
    }

    pub fn set_field(
        &mut self,
        name: impl Into<String>,
        tag: impl Into<String>,
        value: impl Into<Value>,
    ) {
        let name = name.into();
        let tag = tag.into();
        match self.object_type.fields.iter_mut().find(|(f, _)| *f == name) {
            Some(existing) => existing.1 = tag,
            None => self.object_type.fields.push((name.clone(), tag)),
        }
        self.values.insert(name, value.into());
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }

    pub fn len(&self) -> usize {
        self.object_type.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_type.fields.is_empty()
    }
}

impl TaggedObject for DynamicObject {
    fn type_handle(&self) -> &dyn TypeIntrospectable {
        &self.object_type
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}
