//! Integration tests for the relational lookup service
//!
//! Most tests run against an in-memory SQLite database; the mock database is
//! used where the test needs to see exactly what was bound.

mod common;

use async_trait::async_trait;
use common::mocks::MockDatabase;
use common::{coordinates, init_tracing};
use record_lookup::store::PreparedQuery;
use record_lookup::{
    Database, DatabaseLookupConfig, DatabaseLookupService, DynamicObject, FieldType, LookupError,
    RecordLookup, ResultCacheConfig, ServiceState, SqliteDatabase, TypeMapper, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DDL: &str = "CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);
     INSERT INTO T VALUES (1, 'a');
     INSERT INTO T VALUES (2, 'b');";

/// Database wrapper counting prepared statements
struct CountingDatabase {
    inner: SqliteDatabase,
    prepares: AtomicUsize,
}

impl CountingDatabase {
    fn prepares(&self) -> usize {
        self.prepares.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Database for CountingDatabase {
    async fn ping(&self) -> record_lookup::Result<()> {
        self.inner.ping().await
    }

    fn type_mapper(&self) -> Arc<dyn TypeMapper> {
        self.inner.type_mapper()
    }

    async fn prepare(&self, sql: &str) -> record_lookup::Result<Box<dyn PreparedQuery>> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        self.inner.prepare(sql).await
    }
}

async fn sqlite() -> Arc<CountingDatabase> {
    init_tracing();
    let inner = SqliteDatabase::in_memory(Some(DDL))
        .await
        .expect("in-memory database");
    Arc::new(CountingDatabase {
        inner,
        prepares: AtomicUsize::new(0),
    })
}

fn config(cache: ResultCacheConfig) -> DatabaseLookupConfig {
    DatabaseLookupConfig::builder()
        .table_name("T")
        .where_clause("id = ?")
        .cache(cache)
        .build()
}

fn by_id(id: i64) -> record_lookup::Coordinates {
    coordinates(&[("key", Value::from(id)), ("arg0", Value::from(id))])
}

#[tokio::test]
async fn test_second_lookup_served_from_cache() {
    let database = sqlite().await;
    let service = DatabaseLookupService::new(database.clone());
    service.enable(config(ResultCacheConfig::bounded(10))).await.unwrap();

    let first = service.lookup(&by_id(1)).await.unwrap().expect("row 1");
    assert_eq!(first.get("id"), Some(&Value::Long(1)));
    assert_eq!(first.get("name"), Some(&Value::from("a")));
    assert_eq!(database.prepares(), 1);

    let second = service.lookup(&by_id(1)).await.unwrap().expect("row 1");
    assert_eq!(second, first);
    assert_eq!(database.prepares(), 1);

    let stats = service.cache_stats().await.unwrap();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_null_in_untyped_column() {
    init_tracing();
    let database = SqliteDatabase::in_memory(Some(
        "CREATE TABLE T (id, name);
         INSERT INTO T VALUES (1, NULL);
         INSERT INTO T VALUES (2, 'b');",
    ))
    .await
    .unwrap();
    let service = DatabaseLookupService::new(Arc::new(database));
    service.enable(config(ResultCacheConfig::bounded(10))).await.unwrap();

    let record = service.lookup(&by_id(1)).await.unwrap().expect("row 1");
    assert_eq!(record.get("id"), Some(&Value::Long(1)));
    assert_eq!(record.get("name"), Some(&Value::Null));
    assert_eq!(
        record.schema().field("name").map(|f| f.field_type),
        Some(FieldType::String)
    );

    let other = service.lookup(&by_id(2)).await.unwrap().expect("row 2");
    assert_eq!(other.get("name"), Some(&Value::from("b")));
}

#[tokio::test]
async fn test_no_row_is_not_cached() {
    let database = sqlite().await;
    let service = DatabaseLookupService::new(database.clone());
    service.enable(config(ResultCacheConfig::bounded(10))).await.unwrap();

    assert!(service.lookup(&by_id(42)).await.unwrap().is_none());
    assert!(service.lookup(&by_id(42)).await.unwrap().is_none());
    assert_eq!(database.prepares(), 2);
}

#[tokio::test]
async fn test_zero_capacity_always_queries() {
    let database = sqlite().await;
    let service = DatabaseLookupService::new(database.clone());
    service.enable(config(ResultCacheConfig::disabled())).await.unwrap();

    service.lookup(&by_id(1)).await.unwrap().expect("row 1");
    service.lookup(&by_id(1)).await.unwrap().expect("row 1");

    assert_eq!(database.prepares(), 2);
    assert_eq!(service.cache_stats().await.unwrap().entries, 0);
}

#[tokio::test]
async fn test_blank_key_skips_database() {
    let database = sqlite().await;
    let service = DatabaseLookupService::new(database.clone());
    service.enable(config(ResultCacheConfig::bounded(10))).await.unwrap();

    let blank = coordinates(&[("key", Value::from(" ")), ("arg0", Value::from(1i64))]);
    let absent = coordinates(&[("arg0", Value::from(1i64))]);

    assert!(service.lookup(&blank).await.unwrap().is_none());
    assert!(service.lookup(&absent).await.unwrap().is_none());
    assert_eq!(database.prepares(), 0);
}

#[tokio::test]
async fn test_custom_key_name() {
    let database = sqlite().await;
    let service = DatabaseLookupService::new(database.clone());
    let config = DatabaseLookupConfig::builder()
        .table_name("T")
        .value_columns(["name"])
        .where_clause("id = ?")
        .key_name("id")
        .cache(ResultCacheConfig::bounded(10))
        .build();
    service.enable(config).await.unwrap();

    let coords = coordinates(&[("id", Value::from(2i64)), ("arg0", Value::from(2i64))]);
    let record = service.lookup(&coords).await.unwrap().expect("row 2");

    assert_eq!(record.get("name"), Some(&Value::from("b")));
    assert!(record.get("id").is_none());

    // The default key name is not consulted
    let coords = coordinates(&[("key", Value::from(2i64)), ("arg0", Value::from(2i64))]);
    assert!(service.lookup(&coords).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cached_entry_expires() {
    let database = sqlite().await;
    let service = DatabaseLookupService::new(database.clone());
    let cache = ResultCacheConfig::builder()
        .capacity(10)
        .ttl(Duration::from_millis(100))
        .build();
    service.enable(config(cache)).await.unwrap();

    service.lookup(&by_id(1)).await.unwrap();
    service.lookup(&by_id(1)).await.unwrap();
    assert_eq!(database.prepares(), 1);

    tokio::time::sleep(Duration::from_millis(150)).await;

    service.lookup(&by_id(1)).await.unwrap().expect("row 1");
    assert_eq!(database.prepares(), 2);
}

#[tokio::test]
async fn test_statement_error_carries_statement_and_key() {
    let database = sqlite().await;
    let service = DatabaseLookupService::new(database.clone());
    let config = DatabaseLookupConfig::builder()
        .table_name("T")
        .where_clause("missing_column = ?")
        .build();
    service.enable(config).await.unwrap();

    let err = service.lookup(&by_id(1)).await.unwrap_err();

    match &err {
        LookupError::StatementError { statement, key, .. } => {
            assert_eq!(statement, "SELECT * FROM T WHERE missing_column = ?");
            assert_eq!(key, "1");
        }
        other => panic!("expected StatementError, got {:?}", other),
    }
    assert!(err.is_backing_store());
}

#[tokio::test]
async fn test_args_bound_in_position_order() {
    init_tracing();
    let database = MockDatabase::with_row(
        DynamicObject::new("row")
            .with_field("id", "long", 1i64)
            .with_field("name", "string", "a"),
    );
    let service = DatabaseLookupService::new(Arc::new(database.clone()));
    let config = DatabaseLookupConfig::builder()
        .table_name("T")
        .value_columns(["id", "name"])
        .where_clause("id = ? AND name = ?")
        .build();
    service.enable(config).await.unwrap();

    let record = service
        .lookup(&coordinates(&[
            ("key", Value::from("k")),
            ("arg5", Value::from("a")),
            ("arg2", Value::from(1i64)),
        ]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.get("name"), Some(&Value::from("a")));
    assert_eq!(
        database.statements(),
        vec!["SELECT id,name FROM T WHERE id = ? AND name = ?"]
    );
    assert_eq!(
        database.bound(),
        vec![(1, Value::from(1i64)), (2, Value::from("a"))]
    );
}

#[tokio::test]
async fn test_fetch_failure_is_reported_once() {
    init_tracing();
    let database = MockDatabase::default();
    database.fail_fetches();
    let service = DatabaseLookupService::new(Arc::new(database.clone()));
    service.enable(config(ResultCacheConfig::bounded(10))).await.unwrap();

    let err = service.lookup(&by_id(1)).await.unwrap_err();

    assert!(matches!(err, LookupError::StatementError { .. }));
    assert_eq!(database.fetches(), 1);
}

#[tokio::test]
async fn test_reenable_cache_retention() {
    let database = sqlite().await;
    let service = DatabaseLookupService::new(database.clone());
    let keep = ResultCacheConfig::builder()
        .capacity(10)
        .clear_on_enable(false)
        .build();

    service.enable(config(keep.clone())).await.unwrap();
    service.lookup(&by_id(1)).await.unwrap();

    // Same sizing without clear-on-enable keeps cached rows
    service.enable(config(keep.clone())).await.unwrap();
    service.lookup(&by_id(1)).await.unwrap();
    assert_eq!(database.prepares(), 1);

    // Clear-on-enable with a non-zero capacity starts empty
    service.enable(config(ResultCacheConfig::bounded(10))).await.unwrap();
    service.lookup(&by_id(1)).await.unwrap();
    assert_eq!(database.prepares(), 2);
}

#[tokio::test]
async fn test_disable_clears_cache() {
    let database = sqlite().await;
    let service = DatabaseLookupService::new(database.clone());
    let keep = ResultCacheConfig::builder()
        .capacity(10)
        .clear_on_enable(false)
        .build();

    service.enable(config(keep.clone())).await.unwrap();
    service.lookup(&by_id(1)).await.unwrap();

    service.disable().await;
    assert_eq!(service.state(), ServiceState::Disabled);
    assert!(matches!(
        service.cache_stats().await,
        Err(LookupError::NotReady(ServiceState::Disabled))
    ));

    service.enable(config(keep)).await.unwrap();
    service.lookup(&by_id(1)).await.unwrap();
    assert_eq!(database.prepares(), 2);
}

#[tokio::test]
async fn test_concurrent_lookups() {
    let database = sqlite().await;
    let service = Arc::new(DatabaseLookupService::new(database.clone()));
    service.enable(config(ResultCacheConfig::bounded(10))).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.lookup(&by_id(1 + i % 2)).await })
        })
        .collect();

    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert!(record.is_some());
    }

    let stats = service.cache_stats().await.unwrap();
    assert_eq!(stats.hits + stats.misses, 8);
    assert_eq!(stats.entries, 2);
}
