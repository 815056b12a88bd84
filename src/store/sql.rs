//! Relational database adapter over a sqlx SQLite pool

use crate::error::{LookupError, Result};
use crate::schema::mapper::unsupported;
use crate::schema::{DynamicObject, FieldType, TypeMapper, Value};
use crate::store::{Database, PreparedQuery};
use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use futures::TryStreamExt;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::sync::Arc;
use tracing::{debug, info};

/// Type name SQLite reports for a column with no usable declared type
const UNDECLARED: &str = "NULL";

/// Tag for a NULL in a column that carries no type at all
const UNTYPED_NULL: &str = "TEXT";

/// Maps the column type names sqlx reports for SQLite to canonical field types
///
/// sqlx folds declared types by affinity before they get here (`SMALLINT`,
/// `TINYINT` and `INT` all arrive as `INTEGER`), so only its normalized names
/// are listed. `BLOB`, `DATE` and `TIME` have no canonical type.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlTypeMapper;

impl TypeMapper for SqlTypeMapper {
    fn map(&self, tag: &str) -> Result<FieldType> {
        match tag.trim().to_uppercase().as_str() {
            "TEXT" => Ok(FieldType::String),
            "INTEGER" => Ok(FieldType::Long),
            "REAL" => Ok(FieldType::Double),
            "BOOLEAN" => Ok(FieldType::Boolean),
            "DATETIME" => Ok(FieldType::Timestamp),
            _ => Err(unsupported(tag)),
        }
    }
}

/// [`Database`] over a SQLite connection pool
///
/// Each statement acquires one pooled connection for the duration of its
/// execution and returns it on every exit path.
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `url` (e.g. "sqlite://lookup.db")
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to database at {}", url);
        let pool = SqlitePool::connect(url)
            .await
            .map_err(|e| LookupError::StoreError(format!("Failed to connect to {}: {}", url, e)))?;
        Ok(Self::new(pool))
    }

    /// Private in-memory database, optionally initialized with `init_ddl`
    ///
    /// The pool holds exactly one connection that never idles out, since the
    /// database lives only as long as that connection.
    pub async fn in_memory(init_ddl: Option<&str>) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let database = Self::new(pool);
        if let Some(ddl) = init_ddl {
            database.execute_batch(ddl).await?;
        }

        info!("In-memory database ready");
        Ok(database)
    }

    /// Run one or more statements, discarding their results
    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        debug!("Executing batch: {}", sql);
        sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn type_mapper(&self) -> Arc<dyn TypeMapper> {
        Arc::new(SqlTypeMapper)
    }

    async fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedQuery>> {
        Ok(Box::new(SqliteStatement {
            pool: self.pool.clone(),
            sql: sql.to_string(),
            args: Vec::new(),
        }))
    }
}

struct SqliteStatement {
    pool: SqlitePool,
    sql: String,
    args: Vec<Value>,
}

#[async_trait]
impl PreparedQuery for SqliteStatement {
    fn bind(&mut self, position: usize, value: &Value) -> Result<()> {
        let next = self.args.len() + 1;
        if position != next {
            return Err(LookupError::BindError {
                position,
                reason: format!("parameters must be bound in order, expected slot {}", next),
            });
        }
        self.args.push(value.clone());
        Ok(())
    }

    async fn fetch_first(self: Box<Self>) -> Result<Option<DynamicObject>> {
        debug!("Executing statement: {}", self.sql);

        let query = self
            .args
            .iter()
            .fold(sqlx::query(&self.sql), |query, value| bind_value(query, value));

        let mut conn = self.pool.acquire().await?;
        let row = {
            let mut rows = query.fetch(&mut *conn);
            rows.try_next().await?
        };

        row.as_ref().map(row_to_object).transpose()
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::String(v) => query.bind(v.clone()),
        Value::Long(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Boolean(v) => query.bind(*v),
        Value::Double(v) => query.bind(*v),
        Value::Timestamp(v) => query.bind(v.naive_utc()),
        Value::Byte(v) => query.bind(*v),
    }
}

/// Tagged object view of a row
///
/// Tags are the declared column types. Untyped columns take the storage type
/// of the value, and an untyped NULL is tagged as text.
fn row_to_object(row: &SqliteRow) -> Result<DynamicObject> {
    let mut object = DynamicObject::new("row");

    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;

        let declared = column.type_info().name();
        let tag = match (declared, raw.type_info().name()) {
            (UNDECLARED, UNDECLARED) => UNTYPED_NULL.to_string(),
            (UNDECLARED, stored) => stored.to_string(),
            (declared, _) => declared.to_string(),
        };

        let value = if raw.is_null() {
            Value::Null
        } else {
            decode(row, index, &tag)?
        };
        object.set_field(column.name(), tag, value);
    }

    Ok(object)
}

fn decode(row: &SqliteRow, index: usize, tag: &str) -> Result<Value> {
    let value = match tag {
        "TEXT" => Value::String(row.try_get(index)?),
        "INTEGER" => Value::Long(row.try_get(index)?),
        "REAL" => Value::Double(row.try_get(index)?),
        "BOOLEAN" => Value::Boolean(row.try_get(index)?),
        "DATETIME" => {
            let naive: NaiveDateTime = row.try_get(index)?;
            Value::Timestamp(Utc.from_utc_datetime(&naive))
        }
        // No canonical type; schema inference rejects the column
        _ => Value::Null,
    };
    Ok(value)
}
