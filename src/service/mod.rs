//! Lookup services
//!
//! Three services compose schema inference, caching and argument binding
//! against a backing store:
//!
//! - [`KeyLookupService`] fetches a tagged object directly by key;
//! - [`SqlKeyLookupService`] finds the key with a query, then fetches the object;
//! - [`DatabaseLookupService`] selects one row from a relational table, with a
//!   [`ResultCache`](crate::cache::ResultCache) in front.
//!
//! Every service moves through [`ServiceState`]. Lookups are only served while
//! `Enabled`; enabling and disabling wait for in-flight lookups to finish.

pub mod database;
pub mod direct;
pub mod lifecycle;
pub mod sql_key;

use crate::error::Result;
use crate::schema::{Record, Value};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

pub use database::DatabaseLookupService;
pub use crate::config::SchemaPolicy;
pub use direct::KeyLookupService;
pub use lifecycle::Lifecycle;
pub use sql_key::SqlKeyLookupService;

/// Context entry carrying the correlation token
pub const CORRELATION_KEY: &str = "uuid";

/// Coordinate carrying the single lookup value
pub const KEY_COORDINATE: &str = "key";

/// Named lookup inputs supplied per call
pub type Coordinates = HashMap<String, Value>;

/// Service lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    Disabled,
    Enabling,
    Enabled,
    Disabling,
}

impl ServiceState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ServiceState::Enabled)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Disabled => "Disabled",
            ServiceState::Enabling => "Enabling",
            ServiceState::Enabled => "Enabled",
            ServiceState::Disabling => "Disabling",
        };
        write!(f, "{}", name)
    }
}

/// A service resolving coordinates to at most one record
///
/// `Ok(None)` means nothing matched. Failures are never folded into `None`.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    /// Coordinate names every call must carry
    fn required_keys(&self) -> HashSet<&'static str>;

    async fn lookup(&self, coordinates: &Coordinates) -> Result<Option<Record>> {
        self.lookup_with_context(coordinates, &HashMap::new()).await
    }

    /// Lookup with an auxiliary context; its [`CORRELATION_KEY`] entry scopes
    /// the cached schema
    async fn lookup_with_context(
        &self,
        coordinates: &Coordinates,
        context: &HashMap<String, String>,
    ) -> Result<Option<Record>>;
}

/// Correlation token from a lookup context
pub(crate) fn correlation_token(context: &HashMap<String, String>) -> Option<&str> {
    context.get(CORRELATION_KEY).map(String::as_str)
}

/// Non-blank value of `name`, or `None` when absent or blank
pub(crate) fn key_coordinate<'a>(coordinates: &'a Coordinates, name: &str) -> Option<&'a Value> {
    coordinates.get(name).filter(|value| !value.is_blank())
}
