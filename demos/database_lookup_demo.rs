//! Database Lookup Demo Application
//!
//! Builds an in-memory SQLite table, configures the relational lookup service
//! from host-style properties and shows the result cache at work.
//!
//! Usage:
//!   cargo run --example database_lookup_demo

use record_lookup::config::{
    CACHE_EXPIRATION, CACHE_SIZE, TABLE_NAME, VALUE_COLUMNS, WHERE_CLAUSE,
};
use record_lookup::{
    Coordinates, DatabaseLookupConfig, DatabaseLookupService, PropertyMap, RecordLookup,
    SqliteDatabase, Value,
};
use std::sync::Arc;
use tracing::{info, Level};

const DDL: &str = "CREATE TABLE CUSTOMER (id INTEGER PRIMARY KEY, name TEXT, balance REAL, active BOOLEAN);
INSERT INTO CUSTOMER VALUES (1, 'Alice', 120.5, 1);
INSERT INTO CUSTOMER VALUES (2, 'Bob', 0.0, 0);";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("=== Database Lookup Demo ===");

    let database = SqliteDatabase::in_memory(Some(DDL)).await?;

    let properties: PropertyMap = [
        (TABLE_NAME, "CUSTOMER"),
        (VALUE_COLUMNS, "name, balance, active"),
        (WHERE_CLAUSE, "id = ?"),
        (CACHE_SIZE, "100"),
        (CACHE_EXPIRATION, "5 mins"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let config = DatabaseLookupConfig::from_properties(&properties)?;

    let service = DatabaseLookupService::new(Arc::new(database));
    service.enable(config).await?;

    for id in [1i64, 2, 1, 3, 2] {
        let mut coordinates = Coordinates::new();
        coordinates.insert("key".to_string(), Value::from(id));
        coordinates.insert("arg0".to_string(), Value::from(id));

        match service.lookup(&coordinates).await? {
            Some(record) => info!("id {} -> {}", id, record.to_json()),
            None => info!("id {} -> not found", id),
        }
    }

    info!("\n--- Cache statistics ---");
    info!("{}", service.cache_stats().await?);

    service.disable().await;
    info!("\n=== Demo Complete ===");

    Ok(())
}
