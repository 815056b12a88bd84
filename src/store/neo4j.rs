//! Neo4j-backed object store
//!
//! Nodes play the part of tagged objects: the scope of a lookup is a node
//! label, the key is a configured node property, and the Bolt kind of each
//! property value is its type tag.

use crate::error::{LookupError, Result};
use crate::query::{validate_identifier, QueryDialect, ARG_PREFIX};
use crate::schema::mapper::unsupported;
use crate::schema::{DynamicObject, FieldType, TaggedObject, TypeMapper, Value};
use crate::store::ObjectStore;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use neo4rs::{query, BoltNode, BoltNull, BoltType, ConfigBuilder, Graph};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for [`Neo4jStore`]
#[derive(Debug, Clone)]
pub struct Neo4jStoreConfig {
    /// Neo4j connection URI (e.g., "bolt://localhost:7687")
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Database name (default: "neo4j")
    pub database: String,
    /// Node property holding the lookup key
    pub key_property: String,
    /// Deadline applied to every store call
    pub timeout: Duration,
    pub fetch_size: usize,
    pub max_connections: usize,
}

impl Default for Neo4jStoreConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
            key_property: "key".to_string(),
            timeout: Duration::from_secs(5),
            fetch_size: 500,
            max_connections: 16,
        }
    }
}

impl Neo4jStoreConfig {
    /// Read `NEO4J_*` variables, loading a `.env` file first if present
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();
        let var = |name: &str, default: String| std::env::var(name).unwrap_or(default);

        Self {
            uri: var("NEO4J_URI", defaults.uri),
            user: var("NEO4J_USER", defaults.user),
            password: var("NEO4J_PASSWORD", defaults.password),
            database: var("NEO4J_DATABASE", defaults.database),
            key_property: var("NEO4J_KEY_PROPERTY", defaults.key_property),
            timeout: std::env::var("NEO4J_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ..defaults
        }
    }
}

/// Maps Bolt value kinds to canonical field types
#[derive(Debug, Clone, Copy, Default)]
pub struct BoltTypeMapper;

impl TypeMapper for BoltTypeMapper {
    fn map(&self, tag: &str) -> Result<FieldType> {
        match tag {
            "String" => Ok(FieldType::String),
            "Integer" => Ok(FieldType::Long),
            "Float" => Ok(FieldType::Double),
            "Boolean" => Ok(FieldType::Boolean),
            "DateTime" | "LocalDateTime" | "DateTimeZoneId" => Ok(FieldType::Timestamp),
            other => Err(unsupported(other)),
        }
    }
}

/// Object store over a Neo4j graph
pub struct Neo4jStore {
    graph: Graph,
    config: Neo4jStoreConfig,
}

impl Neo4jStore {
    /// Connect to Neo4j
    ///
    /// # Example
    /// ```no_run
    /// use record_lookup::store::{Neo4jStore, Neo4jStoreConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let store = Neo4jStore::connect(Neo4jStoreConfig::from_env()).await?;
    ///     assert!(store.health_check().await?);
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(config: Neo4jStoreConfig) -> Result<Self> {
        validate_identifier("key property", &config.key_property)?;

        info!(
            "Connecting to Neo4j at {} (database: {})",
            config.uri, config.database
        );

        let neo4j_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .db(config.database.as_str())
            .fetch_size(config.fetch_size)
            .max_connections(config.max_connections)
            .build()
            .map_err(|e| LookupError::ConfigError(e.to_string()))?;

        let graph = Graph::connect(neo4j_config)
            .await
            .map_err(|e| LookupError::StoreError(format!("Failed to connect to {}: {}", config.uri, e)))?;

        info!("Successfully connected to Neo4j");

        Ok(Self { graph, config })
    }

    /// Simple health check using RETURN 1
    pub async fn health_check(&self) -> Result<bool> {
        debug!("Executing simple health check (RETURN 1)");
        self.bounded("health check", async {
            self.graph.run(query("RETURN 1")).await?;
            Ok(true)
        })
        .await
    }

    /// Store `object` as a node labelled `scope`, merged on the key property
    pub async fn put(&self, scope: &str, key: &Value, object: &DynamicObject) -> Result<()> {
        validate_identifier("label", scope)?;

        let props: HashMap<String, BoltType> = object
            .type_handle()
            .field_names()
            .into_iter()
            .filter_map(|name| {
                let value = object.field(name)?;
                (!value.is_null()).then(|| (name.to_string(), to_bolt(&value)))
            })
            .collect();

        let statement = format!(
            "MERGE (n:`{}` {{`{}`: $key}}) SET n += $props",
            scope, self.config.key_property
        );
        debug!("Storing object under {}: {}", key, statement);

        let q = query(&statement)
            .param("key", to_bolt(key))
            .param("props", props);
        self.bounded("put", async {
            self.graph.run(q).await?;
            Ok(())
        })
        .await
    }

    /// Delete the node stored under `key` in `scope`
    pub async fn remove(&self, scope: &str, key: &Value) -> Result<()> {
        validate_identifier("label", scope)?;

        let statement = format!(
            "MATCH (n:`{}`) WHERE n.`{}` = $key DETACH DELETE n",
            scope, self.config.key_property
        );
        let q = query(&statement).param("key", to_bolt(key));
        self.bounded("remove", async {
            self.graph.run(q).await?;
            Ok(())
        })
        .await
    }

    /// Get a reference to the underlying Neo4j Graph instance
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &Neo4jStoreConfig {
        &self.config
    }

    async fn bounded<T, F>(&self, context: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.config.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::TimeoutError {
                timeout_ms: self.config.timeout.as_millis() as u64,
                context: context.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ObjectStore for Neo4jStore {
    async fn ping(&self) -> Result<()> {
        self.health_check().await.map(|_| ())
    }

    fn type_mapper(&self) -> Arc<dyn TypeMapper> {
        Arc::new(BoltTypeMapper)
    }

    fn dialect(&self) -> QueryDialect {
        QueryDialect::Cypher
    }

    async fn get(&self, scope: &str, key: &Value) -> Result<Option<DynamicObject>> {
        validate_identifier("label", scope)?;

        let statement = format!(
            "MATCH (n:`{}`) WHERE n.`{}` = $key RETURN n LIMIT 1",
            scope, self.config.key_property
        );
        debug!("Fetching {} from {}", key, scope);

        let q = query(&statement).param("key", to_bolt(key));
        self.bounded("get", async {
            let mut rows = self.graph.execute(q).await?;
            match rows.next().await? {
                Some(row) => {
                    let node: BoltNode = row.get("n")?;
                    Ok(Some(node_to_object(scope, &node)?))
                }
                None => Ok(None),
            }
        })
        .await
    }

    async fn query_keys(
        &self,
        statement: &str,
        key_column: &str,
        args: &[(usize, Value)],
    ) -> Result<Vec<Value>> {
        debug!("Executing key query: {}", statement);

        let q = args.iter().fold(query(statement), |q, (position, value)| {
            q.param(&format!("{}{}", ARG_PREFIX, position), to_bolt(value))
        });

        self.bounded("query", async {
            let mut rows = self.graph.execute(q).await?;
            let mut keys = Vec::new();
            while let Some(row) = rows.next().await? {
                let key: BoltType = row.get(key_column)?;
                keys.push(bolt_value(&key)?);
            }
            Ok(keys)
        })
        .await
    }
}

/// Bolt kind name used as the property's type tag
pub fn bolt_tag(value: &BoltType) -> &'static str {
    match value {
        BoltType::String(_) => "String",
        BoltType::Boolean(_) => "Boolean",
        BoltType::Map(_) => "Map",
        BoltType::Null(_) => "Null",
        BoltType::Integer(_) => "Integer",
        BoltType::Float(_) => "Float",
        BoltType::List(_) => "List",
        BoltType::Node(_) => "Node",
        BoltType::Relation(_) => "Relation",
        BoltType::UnboundedRelation(_) => "UnboundedRelation",
        BoltType::Point2D(_) => "Point2D",
        BoltType::Point3D(_) => "Point3D",
        BoltType::Bytes(_) => "Bytes",
        BoltType::Path(_) => "Path",
        BoltType::Duration(_) => "Duration",
        BoltType::Date(_) => "Date",
        BoltType::Time(_) => "Time",
        BoltType::LocalTime(_) => "LocalTime",
        BoltType::DateTime(_) => "DateTime",
        BoltType::LocalDateTime(_) => "LocalDateTime",
        BoltType::DateTimeZoneId(_) => "DateTimeZoneId",
    }
}

/// Canonical value of a Bolt value; kinds without one become `Null`
///
/// Temporal values that do not convert are an error rather than a `Null`,
/// since their tag still claims a timestamp.
pub fn bolt_value(value: &BoltType) -> Result<Value> {
    let value = match value {
        BoltType::String(s) => Value::String(s.value.clone()),
        BoltType::Integer(i) => Value::Long(i.value),
        BoltType::Float(f) => Value::Double(f.value),
        BoltType::Boolean(b) => Value::Boolean(b.value),
        BoltType::DateTime(dt) => DateTime::<FixedOffset>::try_from(dt)
            .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
            .map_err(|e| conversion_error(value, e))?,
        BoltType::DateTimeZoneId(dt) => DateTime::<FixedOffset>::try_from(dt)
            .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
            .map_err(|e| conversion_error(value, e))?,
        BoltType::LocalDateTime(dt) => NaiveDateTime::try_from(dt)
            .map(|naive| Value::Timestamp(Utc.from_utc_datetime(&naive)))
            .map_err(|e| conversion_error(value, e))?,
        _ => Value::Null,
    };
    Ok(value)
}

fn conversion_error(value: &BoltType, e: neo4rs::Error) -> LookupError {
    LookupError::StoreError(format!("Cannot convert {} value: {}", bolt_tag(value), e))
}

/// Bolt parameter for a canonical value
pub fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::String(s) => BoltType::from(s.as_str()),
        Value::Long(v) => BoltType::from(*v),
        Value::Int(v) => BoltType::from(*v),
        Value::Boolean(v) => BoltType::from(*v),
        Value::Double(v) => BoltType::from(*v),
        Value::Timestamp(v) => BoltType::from(v.fixed_offset()),
        Value::Byte(v) => BoltType::from(*v),
    }
}

/// Tagged object view of a node; properties are ordered by name
fn node_to_object(scope: &str, node: &BoltNode) -> Result<DynamicObject> {
    let mut properties: Vec<(&String, &BoltType)> = node
        .properties
        .value
        .iter()
        .map(|(name, value)| (&name.value, value))
        .collect();
    properties.sort_by(|a, b| a.0.cmp(b.0));

    properties
        .into_iter()
        .try_fold(DynamicObject::new(scope), |object, (name, value)| {
            Ok(object.with_field(name.as_str(), bolt_tag(value), bolt_value(value)?))
        })
}
