//! Key Lookup Demo Application
//!
//! Stores a few nodes in Neo4j and reads them back through the direct and
//! query-based lookup services.
//!
//! Usage:
//!   cargo run --example key_lookup_demo
//!
//! Environment variables:
//!   NEO4J_URI          - Neo4j connection URI (default: bolt://localhost:7687)
//!   NEO4J_USER         - Neo4j username (default: neo4j)
//!   NEO4J_PASSWORD     - Neo4j password (default: password)
//!   NEO4J_DATABASE     - Neo4j database name (default: neo4j)
//!   NEO4J_KEY_PROPERTY - Node property holding the lookup key (default: key)

use record_lookup::{
    Coordinates, DynamicObject, KeyLookupConfig, KeyLookupService, Neo4jStore, Neo4jStoreConfig,
    RecordLookup, SqlKeyLookupConfig, SqlKeyLookupService, Value,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, Level};

const LABEL: &str = "DemoPerson";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("=== Key Lookup Demo ===");

    let config = Neo4jStoreConfig::from_env();
    let store = Arc::new(Neo4jStore::connect(config).await?);

    for (key, name, age) in [("alice", "Alice", 41i64), ("bob", "Bob", 29)] {
        let person = DynamicObject::new(LABEL)
            .with_field("name", "String", name)
            .with_field("age", "Integer", age);
        store.put(LABEL, &Value::from(key), &person).await?;
    }
    info!("Stored demo nodes under label {}", LABEL);

    info!("\n--- Direct key lookup ---");
    let direct = KeyLookupService::new(store.clone());
    direct
        .enable(KeyLookupConfig::new(LABEL).with_fields(["name", "age"]))
        .await?;

    let context = HashMap::from([("uuid".to_string(), "demo-event-1".to_string())]);
    for key in ["alice", "bob", "carol"] {
        let mut coordinates = Coordinates::new();
        coordinates.insert("key".to_string(), Value::from(key));

        match direct.lookup_with_context(&coordinates, &context).await? {
            Some(record) => info!("{} -> {}", key, record.to_json()),
            None => info!("{} -> not found", key),
        }
    }

    info!("\n--- Query key lookup ---");
    let by_query = SqlKeyLookupService::new(store.clone());
    by_query
        .enable(
            SqlKeyLookupConfig::builder()
                .cache_name(LABEL)
                .key_column(store.config().key_property.as_str())
                .where_clause("n.age > $arg0")
                .build(),
        )
        .await?;

    let mut coordinates = Coordinates::new();
    coordinates.insert("arg0".to_string(), Value::from(35i64));
    match by_query.lookup(&coordinates).await? {
        Some(record) => info!("age > 35 -> {}", record.to_json()),
        None => info!("age > 35 -> not found"),
    }

    direct.disable().await;
    by_query.disable().await;

    for key in ["alice", "bob"] {
        store.remove(LABEL, &Value::from(key)).await?;
    }
    info!("\n=== Demo Complete ===");

    Ok(())
}
