//! Canonical field types and values shared by every backing store

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Canonical field type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Long,
    Int,
    Boolean,
    Double,
    Timestamp,
    Byte,
}

impl FieldType {
    /// All canonical types, in declaration order
    pub const ALL: [FieldType; 7] = [
        FieldType::String,
        FieldType::Long,
        FieldType::Int,
        FieldType::Boolean,
        FieldType::Double,
        FieldType::Timestamp,
        FieldType::Byte,
    ];

    /// Lower-case canonical tag
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Long => "long",
            FieldType::Int => "int",
            FieldType::Boolean => "boolean",
            FieldType::Double => "double",
            FieldType::Timestamp => "timestamp",
            FieldType::Byte => "byte",
        }
    }

    /// Parse a canonical tag (case-insensitive)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "string" => Some(FieldType::String),
            "long" => Some(FieldType::Long),
            "int" => Some(FieldType::Int),
            "boolean" => Some(FieldType::Boolean),
            "double" => Some(FieldType::Double),
            "timestamp" => Some(FieldType::Timestamp),
            "byte" => Some(FieldType::Byte),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field value read from a backing store or supplied as a coordinate
///
/// `Value` is used as part of cache keys, so it has value semantics: doubles
/// compare and hash by their bit pattern.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    String(String),
    Long(i64),
    Int(i32),
    Boolean(bool),
    Double(f64),
    Timestamp(DateTime<Utc>),
    Byte(i8),
}

impl Value {
    /// Canonical type of the value, `None` for null
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Value::Null => None,
            Value::String(_) => Some(FieldType::String),
            Value::Long(_) => Some(FieldType::Long),
            Value::Int(_) => Some(FieldType::Int),
            Value::Boolean(_) => Some(FieldType::Boolean),
            Value::Double(_) => Some(FieldType::Double),
            Value::Timestamp(_) => Some(FieldType::Timestamp),
            Value::Byte(_) => Some(FieldType::Byte),
        }
    }

    /// Null, or a string that is empty after trimming
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integral value widened to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Byte(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::String(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Boolean(v) => v.hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::Timestamp(v) => v.hash(state),
            Value::Byte(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::String(v) => f.write_str(v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Byte(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Byte(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
