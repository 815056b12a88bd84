//! Integration tests for the Neo4j object store and the lookups built on it
//!
//! These tests require a running Neo4j instance; connection details are read
//! from `NEO4J_*` environment variables (or a `.env` file).

mod common;

use common::{context, coordinates, init_tracing, new_token};
use record_lookup::store::neo4j::Neo4jStore;
use record_lookup::{
    DynamicObject, KeyLookupConfig, KeyLookupService, Neo4jStoreConfig, ObjectStore,
    RecordLookup, SqlKeyLookupConfig, SqlKeyLookupService, TaggedObject, Value,
};
use std::sync::Arc;

// Each test writes under its own label so runs do not interfere
fn unique_label() -> String {
    format!("Lookup_{}", new_token().replace('-', ""))
}

async fn connect() -> Arc<Neo4jStore> {
    init_tracing();
    let store = Neo4jStore::connect(Neo4jStoreConfig::from_env())
        .await
        .expect("Failed to connect to Neo4j");
    Arc::new(store)
}

#[tokio::test]
#[ignore] // Run with: cargo test --ignored
async fn test_health_check() {
    let store = connect().await;

    let result = store.health_check().await;
    assert!(result.is_ok(), "Health check should succeed");
    assert!(result.unwrap(), "Health check should return true");
    assert!(store.ping().await.is_ok());
}

#[tokio::test]
#[ignore]
async fn test_put_get_remove() {
    let store = connect().await;
    let label = unique_label();
    let key = Value::from("my-record");

    let object = DynamicObject::new(label.as_str())
        .with_field("name", "String", "my-record")
        .with_field("count", "Integer", 3i64);
    store.put(&label, &key, &object).await.unwrap();

    let fetched = store.get(&label, &key).await.unwrap().expect("node should exist");
    assert_eq!(fetched.field("count"), Some(Value::Long(3)));

    store.remove(&label, &key).await.unwrap();
    assert!(store.get(&label, &key).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_key_lookup_end_to_end() {
    let store = connect().await;
    let label = unique_label();
    let object = DynamicObject::new(label.as_str()).with_field("name", "String", "my-record");
    store.put(&label, &Value::from("my-record"), &object).await.unwrap();

    let service = KeyLookupService::new(store.clone());
    service
        .enable(KeyLookupConfig::new(label.as_str()).with_fields(["name"]))
        .await
        .unwrap();

    let token = new_token();
    let record = service
        .lookup_with_context(&coordinates(&[("key", Value::from("my-record"))]), &context(&token))
        .await
        .unwrap()
        .expect("record should be found");
    assert_eq!(record.get("name"), Some(&Value::from("my-record")));

    let missing = service
        .lookup(&coordinates(&[("key", Value::from("missing"))]))
        .await
        .unwrap();
    assert!(missing.is_none());

    store.remove(&label, &Value::from("my-record")).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_query_key_lookup_end_to_end() {
    let store = connect().await;
    let label = unique_label();
    let object = DynamicObject::new(label.as_str())
        .with_field("name", "String", "alice")
        .with_field("age", "Integer", 41i64);
    store.put(&label, &Value::from("p1"), &object).await.unwrap();

    let service = SqlKeyLookupService::new(store.clone());
    let config = SqlKeyLookupConfig::builder()
        .cache_name(label.as_str())
        .key_column("key")
        .where_clause("n.age > $arg0")
        .build();
    service.enable(config).await.unwrap();

    let record = service
        .lookup(&coordinates(&[("arg0", Value::from(40i64))]))
        .await
        .unwrap()
        .expect("record should be found");
    assert_eq!(record.get("age"), Some(&Value::Long(41)));

    store.remove(&label, &Value::from("p1")).await.unwrap();
}
