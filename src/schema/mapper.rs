//! Mapping from store-specific type tags to canonical field types

use crate::error::{LookupError, Result};
use crate::schema::types::FieldType;

/// Maps a backing store's type tag to a canonical field type
///
/// Each store vocabulary gets its own mapper; every mapper fails with
/// [`LookupError::UnsupportedType`] for tags it does not know.
pub trait TypeMapper: Send + Sync {
    fn map(&self, tag: &str) -> Result<FieldType>;
}

/// Mapper for the canonical tag vocabulary (`string`, `long`, `int`, ...)
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalTypeMapper;

impl TypeMapper for CanonicalTypeMapper {
    fn map(&self, tag: &str) -> Result<FieldType> {
        FieldType::from_tag(tag).ok_or_else(|| unsupported(tag))
    }
}

pub(crate) fn unsupported(tag: &str) -> LookupError {
    LookupError::UnsupportedType {
        tag: tag.to_string(),
        field: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_identity() {
        let mapper = CanonicalTypeMapper;
        for field_type in FieldType::ALL {
            assert_eq!(mapper.map(field_type.as_str()).unwrap(), field_type);
        }
    }

    #[test]
    fn test_canonical_rejects_unknown_tags() {
        let mapper = CanonicalTypeMapper;
        for tag in ["decimal", "date", "object", "", "java.lang.String"] {
            match mapper.map(tag) {
                Err(LookupError::UnsupportedType { tag: reported, .. }) => {
                    assert_eq!(reported, tag)
                }
                other => panic!("expected UnsupportedType for {:?}, got {:?}", tag, other),
            }
        }
    }
}
