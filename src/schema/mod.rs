//! Record schema module
//!
//! Canonical field types and values, record schemas, the tagged-object
//! capability traits, and the inference that turns one into the other.

pub mod inference;
pub mod mapper;
pub mod object;
pub mod record;
pub mod types;

pub use inference::{RecordBuilder, SchemaInferencer, SYNTHETIC_FIELD};
pub use mapper::{CanonicalTypeMapper, TypeMapper};
pub use object::{DynamicObject, ObjectType, TaggedObject, TypeIntrospectable};
pub use record::{Record, RecordField, RecordSchema};
pub use types::{FieldType, Value};
