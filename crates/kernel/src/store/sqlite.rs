//! SQLite row store.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use super::{BuiltQuery, Dialect, RowStore, StoreError, bind, row_count, with_timeout};

/// Row store backed by a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

/// Convert a row into a JSON object keyed by column name.
///
/// SQLite is dynamically typed, so each value is decoded by its storage
/// class rather than by the declared column type.
fn row_to_json(row: &SqliteRow) -> Result<JsonValue, StoreError> {
    let mut object = Map::with_capacity(row.columns().len());

    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            JsonValue::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => JsonValue::from(row.try_get_unchecked::<i64, _>(index)?),
                "REAL" => JsonValue::from(row.try_get_unchecked::<f64, _>(index)?),
                "BLOB" => {
                    let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                    JsonValue::from(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => JsonValue::from(row.try_get_unchecked::<String, _>(index)?),
            }
        };
        object.insert(column.name().to_string(), value);
    }

    Ok(JsonValue::Object(object))
}

#[async_trait]
impl RowStore for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn count(&self, query: &BuiltQuery) -> Result<u64, StoreError> {
        with_timeout(self.timeout, async {
            let args = bind::arguments::<Sqlite>(&query.values)?;
            let total: i64 = sqlx::query_scalar_with(&query.sql, args)
                .fetch_one(&self.pool)
                .await?;
            Ok::<_, StoreError>(row_count(total))
        })
        .await
    }

    async fn fetch_all(&self, query: &BuiltQuery) -> Result<Vec<JsonValue>, StoreError> {
        with_timeout(self.timeout, async {
            let args = bind::arguments::<Sqlite>(&query.values)?;
            let rows = sqlx::query_with(&query.sql, args)
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(row_to_json).collect::<Result<Vec<_>, StoreError>>()
        })
        .await
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
