//! In-memory collaborators that count how often they are called

use async_trait::async_trait;
use record_lookup::query::QueryDialect;
use record_lookup::schema::{CanonicalTypeMapper, FieldType};
use record_lookup::store::PreparedQuery;
use record_lookup::{Database, DynamicObject, LookupError, ObjectStore, Result, TypeMapper, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Canonical mapper that counts every tag it maps
#[derive(Default)]
pub struct CountingTypeMapper {
    calls: AtomicUsize,
}

impl CountingTypeMapper {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TypeMapper for CountingTypeMapper {
    fn map(&self, tag: &str) -> Result<FieldType> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CanonicalTypeMapper.map(tag)
    }
}

/// Key query as the object store received it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub statement: String,
    pub key_column: String,
    pub args: Vec<(usize, Value)>,
}

/// Object store over a map of `(scope, key)` to objects
pub struct MockObjectStore {
    objects: Mutex<HashMap<(String, Value), DynamicObject>>,
    query_results: Mutex<Vec<Value>>,
    queries: Mutex<Vec<RecordedQuery>>,
    pub mapper: Arc<CountingTypeMapper>,
    pub dialect: QueryDialect,
    pub get_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    pub ping_calls: AtomicUsize,
    pub fail_ping: AtomicBool,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            query_results: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            mapper: Arc::new(CountingTypeMapper::default()),
            dialect: QueryDialect::Sql,
            get_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
            ping_calls: AtomicUsize::new(0),
            fail_ping: AtomicBool::new(false),
        }
    }

    pub fn insert(&self, scope: &str, key: impl Into<Value>, object: DynamicObject) {
        self.objects
            .lock()
            .unwrap()
            .insert((scope.to_string(), key.into()), object);
    }

    /// Keys every subsequent key query returns
    pub fn set_query_results(&self, keys: Vec<Value>) {
        *self.query_results.lock().unwrap() = keys;
    }

    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn gets(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn key_queries(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn inference_calls(&self) -> usize {
        self.mapper.calls()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn ping(&self) -> Result<()> {
        self.ping_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(LookupError::StoreError("connection refused".to_string()));
        }
        Ok(())
    }

    fn type_mapper(&self) -> Arc<dyn TypeMapper> {
        self.mapper.clone()
    }

    fn dialect(&self) -> QueryDialect {
        self.dialect
    }

    async fn get(&self, scope: &str, key: &Value) -> Result<Option<DynamicObject>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(&(scope.to_string(), key.clone()))
            .cloned())
    }

    async fn query_keys(
        &self,
        statement: &str,
        key_column: &str,
        args: &[(usize, Value)],
    ) -> Result<Vec<Value>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(RecordedQuery {
            statement: statement.to_string(),
            key_column: key_column.to_string(),
            args: args.to_vec(),
        });
        Ok(self.query_results.lock().unwrap().clone())
    }
}

/// Database returning a fixed first row for every statement
#[derive(Clone, Default)]
pub struct MockDatabase {
    row: Arc<Mutex<Option<DynamicObject>>>,
    statements: Arc<Mutex<Vec<String>>>,
    bound: Arc<Mutex<Vec<(usize, Value)>>>,
    fetches: Arc<AtomicUsize>,
    fail_fetch: Arc<AtomicBool>,
}

impl MockDatabase {
    pub fn with_row(row: DynamicObject) -> Self {
        let database = Self::default();
        *database.row.lock().unwrap() = Some(row);
        database
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    /// Arguments bound to the most recent statement
    pub fn bound(&self) -> Vec<(usize, Value)> {
        self.bound.lock().unwrap().clone()
    }

    pub fn fail_fetches(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Database for MockDatabase {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn type_mapper(&self) -> Arc<dyn TypeMapper> {
        Arc::new(CanonicalTypeMapper)
    }

    async fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedQuery>> {
        self.statements.lock().unwrap().push(sql.to_string());
        self.bound.lock().unwrap().clear();
        Ok(Box::new(MockStatement {
            database: self.clone(),
        }))
    }
}

struct MockStatement {
    database: MockDatabase,
}

#[async_trait]
impl PreparedQuery for MockStatement {
    fn bind(&mut self, position: usize, value: &Value) -> Result<()> {
        self.database
            .bound
            .lock()
            .unwrap()
            .push((position, value.clone()));
        Ok(())
    }

    async fn fetch_first(self: Box<Self>) -> Result<Option<DynamicObject>> {
        self.database.fetches.fetch_add(1, Ordering::SeqCst);
        if self.database.fail_fetch.load(Ordering::SeqCst) {
            return Err(LookupError::StoreError("connection reset".to_string()));
        }
        Ok(self.database.row.lock().unwrap().clone())
    }
}
