//! Service configuration
//!
//! Each lookup service takes a typed config struct. Hosts that hand over
//! resolved property values by name can build them with `from_properties`,
//! which reads the following keys:
//!
//! | Property                                   | Service                 | Default |
//! |--------------------------------------------|-------------------------|---------|
//! | `ignite-cache-name`                        | key, sql-key            | required |
//! | `cache-field-names`                        | key, sql-key            | all fields |
//! | `key-column`                               | sql-key                 | required |
//! | `where-clause`                             | sql-key, database       | required |
//! | `dbrecord-lookup-table-name`               | database                | required |
//! | `dbrecord-lookup-value-columns`            | database                | all columns |
//! | `dbrecord-lookup-key-name`                 | database                | `key` |
//! | `dbrecord-lookup-cache-size`               | database                | `0` |
//! | `dbrecord-lookup-clear-cache-on-enabled`   | database                | `true` |
//! | `Cache Expiration`                         | database                | no expiry |

use crate::cache::ResultCacheConfig;
use crate::error::{LookupError, Result};
use crate::query::validate_identifier;
use crate::service::KEY_COORDINATE;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use std::time::Duration;

/// Resolved host property values by name
pub type PropertyMap = HashMap<String, String>;

pub const CACHE_NAME: &str = "ignite-cache-name";
pub const FIELDS_TO_RETURN: &str = "cache-field-names";
pub const KEY_COLUMN: &str = "key-column";
pub const WHERE_CLAUSE: &str = "where-clause";
pub const TABLE_NAME: &str = "dbrecord-lookup-table-name";
pub const VALUE_COLUMNS: &str = "dbrecord-lookup-value-columns";
pub const KEY_NAME: &str = "dbrecord-lookup-key-name";
pub const CACHE_SIZE: &str = "dbrecord-lookup-cache-size";
pub const CLEAR_CACHE_ON_ENABLED: &str = "dbrecord-lookup-clear-cache-on-enabled";
pub const CACHE_EXPIRATION: &str = "Cache Expiration";

static TIME_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]+)\s*([A-Za-z]*)\s*$").expect("time period pattern is valid")
});

/// How the direct key lookup derives record schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPolicy {
    /// Infer once per correlation token and reuse the schema
    #[default]
    PerCorrelation,
    /// Infer from every fetched object, ignoring the field allow-list
    PerLookup,
}

/// Configuration for [`KeyLookupService`](crate::service::KeyLookupService)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyLookupConfig {
    /// Cache (or label) holding the objects
    pub cache_name: String,

    /// Fields to return; `None` returns every field
    pub fields: Option<Vec<String>>,

    pub schema_policy: SchemaPolicy,
}

impl KeyLookupConfig {
    pub fn new(cache_name: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            ..Default::default()
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_schema_policy(mut self, policy: SchemaPolicy) -> Self {
        self.schema_policy = policy;
        self
    }

    pub fn from_properties(properties: &PropertyMap) -> Result<Self> {
        let config = Self {
            cache_name: required(properties, CACHE_NAME)?,
            fields: optional(properties, FIELDS_TO_RETURN).map(|list| split_list(&list)),
            schema_policy: SchemaPolicy::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("cache name", &self.cache_name)?;
        validate_fields(self.fields.as_deref())
    }

    /// Field allow-list as a set, if one is configured
    pub fn allowed_fields(&self) -> Option<HashSet<String>> {
        self.fields.as_ref().map(|fields| fields.iter().cloned().collect())
    }
}

/// Configuration for [`SqlKeyLookupService`](crate::service::SqlKeyLookupService)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SqlKeyLookupConfig {
    pub cache_name: String,
    pub fields: Option<Vec<String>>,

    /// Column (or property) holding the object key
    pub key_column: String,

    /// Where-clause template with positional placeholders for `argN` coordinates
    pub where_clause: String,
}

impl SqlKeyLookupConfig {
    pub fn builder() -> SqlKeyLookupConfigBuilder {
        SqlKeyLookupConfigBuilder::default()
    }

    pub fn from_properties(properties: &PropertyMap) -> Result<Self> {
        let config = Self {
            cache_name: required(properties, CACHE_NAME)?,
            fields: optional(properties, FIELDS_TO_RETURN).map(|list| split_list(&list)),
            key_column: required(properties, KEY_COLUMN)?,
            where_clause: required(properties, WHERE_CLAUSE)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("cache name", &self.cache_name)?;
        validate_identifier("key column", &self.key_column)?;
        validate_fields(self.fields.as_deref())?;
        if self.where_clause.trim().is_empty() {
            return Err(LookupError::ConfigError(
                "where clause must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn allowed_fields(&self) -> Option<HashSet<String>> {
        self.fields.as_ref().map(|fields| fields.iter().cloned().collect())
    }
}

/// Builder for [`SqlKeyLookupConfig`]
#[derive(Debug, Default)]
pub struct SqlKeyLookupConfigBuilder {
    config: SqlKeyLookupConfig,
}

impl SqlKeyLookupConfigBuilder {
    pub fn cache_name(mut self, name: impl Into<String>) -> Self {
        self.config.cache_name = name.into();
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn key_column(mut self, column: impl Into<String>) -> Self {
        self.config.key_column = column.into();
        self
    }

    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        self.config.where_clause = clause.into();
        self
    }

    pub fn build(self) -> SqlKeyLookupConfig {
        self.config
    }
}

/// Configuration for [`DatabaseLookupService`](crate::service::DatabaseLookupService)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseLookupConfig {
    pub table_name: String,

    /// Columns to select; empty selects `*`
    pub value_columns: Vec<String>,

    /// Where-clause template with `?` placeholders for `argN` coordinates
    pub where_clause: String,

    /// Coordinate holding the logical lookup key
    pub key_name: String,

    pub cache: ResultCacheConfig,
}

impl Default for DatabaseLookupConfig {
    fn default() -> Self {
        Self {
            table_name: String::new(),
            value_columns: Vec::new(),
            where_clause: String::new(),
            key_name: KEY_COORDINATE.to_string(),
            cache: ResultCacheConfig::default(),
        }
    }
}

impl DatabaseLookupConfig {
    pub fn builder() -> DatabaseLookupConfigBuilder {
        DatabaseLookupConfigBuilder::default()
    }

    pub fn from_properties(properties: &PropertyMap) -> Result<Self> {
        let capacity = match optional(properties, CACHE_SIZE) {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                LookupError::ConfigError(format!(
                    "{} must be a non-negative integer, got `{}`",
                    CACHE_SIZE, raw
                ))
            })?,
            None => 0,
        };

        let clear_on_enable = match optional(properties, CLEAR_CACHE_ON_ENABLED) {
            Some(raw) => parse_bool(CLEAR_CACHE_ON_ENABLED, &raw)?,
            None => true,
        };

        let ttl = optional(properties, CACHE_EXPIRATION)
            .map(|raw| parse_time_period(&raw))
            .transpose()?;

        let config = Self {
            table_name: required(properties, TABLE_NAME)?,
            value_columns: optional(properties, VALUE_COLUMNS)
                .map(|list| split_list(&list))
                .unwrap_or_default(),
            where_clause: required(properties, WHERE_CLAUSE)?,
            key_name: optional(properties, KEY_NAME).unwrap_or_else(|| KEY_COORDINATE.to_string()),
            cache: ResultCacheConfig {
                capacity,
                ttl,
                clear_on_enable,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier("table name", &self.table_name)?;
        for column in &self.value_columns {
            validate_identifier("value column", column)?;
        }
        if self.where_clause.trim().is_empty() {
            return Err(LookupError::ConfigError(
                "where clause must not be empty".to_string(),
            ));
        }
        if self.key_name.trim().is_empty() {
            return Err(LookupError::ConfigError(
                "lookup key name must not be empty".to_string(),
            ));
        }
        self.cache.validate().map_err(LookupError::ConfigError)
    }
}

/// Builder for [`DatabaseLookupConfig`]
#[derive(Debug, Default)]
pub struct DatabaseLookupConfigBuilder {
    config: DatabaseLookupConfig,
}

impl DatabaseLookupConfigBuilder {
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.config.table_name = name.into();
        self
    }

    pub fn value_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.value_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        self.config.where_clause = clause.into();
        self
    }

    pub fn key_name(mut self, name: impl Into<String>) -> Self {
        self.config.key_name = name.into();
        self
    }

    pub fn cache(mut self, cache: ResultCacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    pub fn build(self) -> DatabaseLookupConfig {
        self.config
    }
}

/// Split a comma separated list, dropping blanks and repeats, keeping order
pub fn split_list(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_string()))
        .map(str::to_string)
        .collect()
}

/// Parse a time period such as "30 secs", "5 mins" or "100 millis"
///
/// A bare number is taken as seconds.
pub fn parse_time_period(raw: &str) -> Result<Duration> {
    let invalid = || LookupError::ConfigError(format!("`{}` is not a valid time period", raw));

    let captures = TIME_PERIOD.captures(raw).ok_or_else(invalid)?;
    let amount: u64 = captures[1].parse().map_err(|_| invalid())?;

    let millis_per_unit: u64 = match captures[2].to_lowercase().as_str() {
        "ms" | "milli" | "millis" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1,
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1_000,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000,
        "d" | "day" | "days" => 86_400_000,
        _ => return Err(invalid()),
    };

    amount
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(invalid)
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(LookupError::ConfigError(format!(
            "{} must be `true` or `false`, got `{}`",
            name, raw
        ))),
    }
}

fn optional(properties: &PropertyMap, name: &str) -> Option<String> {
    properties
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn required(properties: &PropertyMap, name: &str) -> Result<String> {
    optional(properties, name)
        .ok_or_else(|| LookupError::ConfigError(format!("missing required property `{}`", name)))
}

fn validate_fields(fields: Option<&[String]>) -> Result<()> {
    match fields {
        Some([]) => Err(LookupError::ConfigError(
            "field list must name at least one field".to_string(),
        )),
        _ => Ok(()),
    }
}
