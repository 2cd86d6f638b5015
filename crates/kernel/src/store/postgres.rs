//! PostgreSQL row store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value as JsonValue};
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

use super::{BuiltQuery, Dialect, RowStore, StoreError, bind, row_count, with_timeout};

/// Row store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

/// Convert a row into a JSON object keyed by column name.
///
/// Values are decoded by the column's PostgreSQL type. Types without a
/// mapping are read as text; anything that fails to decode becomes null.
fn row_to_json(row: &PgRow) -> JsonValue {
    let mut object = Map::with_capacity(row.columns().len());

    for (index, column) in row.columns().iter().enumerate() {
        let value = match column.type_info().name() {
            "BOOL" => get::<bool>(row, index).map(JsonValue::Bool),
            "INT2" => get::<i16>(row, index).map(JsonValue::from),
            "INT4" => get::<i32>(row, index).map(JsonValue::from),
            "INT8" => get::<i64>(row, index).map(JsonValue::from),
            "FLOAT4" => get::<f32>(row, index)
                .and_then(|v| Number::from_f64(f64::from(v)))
                .map(JsonValue::Number),
            "FLOAT8" => get::<f64>(row, index)
                .and_then(Number::from_f64)
                .map(JsonValue::Number),
            "TIMESTAMP" => get::<NaiveDateTime>(row, index)
                .map(|v| JsonValue::from(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
            "TIMESTAMPTZ" => {
                get::<DateTime<Utc>>(row, index).map(|v| JsonValue::from(v.to_rfc3339()))
            }
            "DATE" => get::<NaiveDate>(row, index).map(|v| JsonValue::from(v.to_string())),
            "JSON" | "JSONB" => get::<JsonValue>(row, index),
            _ => get::<String>(row, index).map(JsonValue::String),
        };
        object.insert(column.name().to_string(), value.unwrap_or(JsonValue::Null));
    }

    JsonValue::Object(object)
}

fn get<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index).ok().flatten()
}

#[async_trait]
impl RowStore for PgStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn count(&self, query: &BuiltQuery) -> Result<u64, StoreError> {
        with_timeout(self.timeout, async {
            let args = bind::arguments::<Postgres>(&query.values)?;
            let total: i64 = sqlx::query_scalar_with(&query.sql, args)
                .fetch_one(&self.pool)
                .await?;
            Ok::<_, StoreError>(row_count(total))
        })
        .await
    }

    async fn fetch_all(&self, query: &BuiltQuery) -> Result<Vec<JsonValue>, StoreError> {
        with_timeout(self.timeout, async {
            let args = bind::arguments::<Postgres>(&query.values)?;
            let rows = sqlx::query_with(&query.sql, args)
                .fetch_all(&self.pool)
                .await?;
            Ok::<_, StoreError>(rows.iter().map(row_to_json).collect())
        })
        .await
    }

    /// Count and page run in one transaction under a statement timeout,
    /// so both see the same snapshot.
    async fn fetch_page(
        &self,
        count: &BuiltQuery,
        page: &BuiltQuery,
    ) -> Result<(u64, Vec<JsonValue>), StoreError> {
        with_timeout(self.timeout, async {
            let mut tx = self.pool.begin().await?;

            // SET LOCAL resets on commit or rollback.
            sqlx::query(&format!(
                "SET LOCAL statement_timeout = {}",
                self.timeout.as_millis()
            ))
            .execute(&mut *tx)
            .await?;

            let args = bind::arguments::<Postgres>(&count.values)?;
            let total: i64 = sqlx::query_scalar_with(&count.sql, args)
                .fetch_one(&mut *tx)
                .await?;

            let args = bind::arguments::<Postgres>(&page.values)?;
            let rows = sqlx::query_with(&page.sql, args)
                .fetch_all(&mut *tx)
                .await?;

            tx.commit().await?;

            Ok::<_, StoreError>((row_count(total), rows.iter().map(row_to_json).collect()))
        })
        .await
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
