//! Error types for record lookups
//!
//! Every failure a lookup can report is a variant of [`LookupError`]. A lookup
//! that simply finds nothing is not an error: it returns `Ok(None)`.

use crate::service::ServiceState;
use thiserror::Error;

/// Main error type for lookup operations
#[derive(Error, Debug)]
pub enum LookupError {
    /// Bad or missing configuration value
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The service could not be enabled (store unreachable, bad pool, ...)
    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// A backing type tag has no canonical equivalent
    #[error("Unsupported type `{tag}`{}", .field.as_ref().map(|f| format!(" for field `{}`", f)).unwrap_or_default())]
    UnsupportedType { tag: String, field: Option<String> },

    /// A positional argument could not be bound to a statement
    #[error("Cannot bind argument at position {position}: {reason}")]
    BindError { position: usize, reason: String },

    /// Backing store failure that did not come from a driver
    #[error("Backing store error: {0}")]
    StoreError(String),

    /// Store call exceeded the adapter's deadline
    #[error("Operation timed out after {timeout_ms}ms: {context}")]
    TimeoutError { timeout_ms: u64, context: String },

    /// Lookup attempted while the service is not enabled
    #[error("Lookup service is not ready (state: {0})")]
    NotReady(ServiceState),

    /// Failure while running a lookup statement, with the statement and key that caused it
    #[error("Error executing statement `{statement}` for value {key}: {source}")]
    StatementError {
        statement: String,
        key: String,
        #[source]
        source: Box<LookupError>,
    },

    /// Neo4rs driver error (wrapper)
    #[error("Neo4rs driver error: {0}")]
    DriverError(#[from] neo4rs::Error),

    /// Neo4rs row decoding error (wrapper)
    #[error("Neo4rs decoding error: {0}")]
    DecodeError(#[from] neo4rs::DeError),

    /// sqlx database error (wrapper)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl LookupError {
    /// True for errors that leave a service disabled until its configuration changes
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LookupError::ConfigError(_) | LookupError::InitializationError(_)
        )
    }

    /// True for failures raised by the backing store or database
    pub fn is_backing_store(&self) -> bool {
        match self {
            LookupError::StoreError(_)
            | LookupError::TimeoutError { .. }
            | LookupError::DriverError(_)
            | LookupError::DecodeError(_)
            | LookupError::DatabaseError(_) => true,
            LookupError::StatementError { source, .. } => source.is_backing_store(),
            _ => false,
        }
    }
}

/// Result type alias for lookup operations
pub type Result<T> = std::result::Result<T, LookupError>;

impl From<String> for LookupError {
    fn from(s: String) -> Self {
        LookupError::Other(s)
    }
}

impl From<&str> for LookupError {
    fn from(s: &str) -> Self {
        LookupError::Other(s.to_string())
    }
}
