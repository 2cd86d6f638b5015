//! Row storage seam between the list engine and the database driver.
//!
//! The engine hands over statements rendered for the store's dialect and
//! gets rows back as JSON objects. PostgreSQL is the production backend;
//! SQLite serves embedded deployments and the test suite.

mod bind;
mod postgres;
mod sqlite;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sea_query::{PostgresQueryBuilder, SelectStatement, SqliteQueryBuilder, Values};
use serde_json::Value as JsonValue;
use thiserror::Error;

pub use postgres::PgStore;
pub use sqlite::SqliteStore;

/// SQL dialect a store speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Render a statement into SQL text plus the values to bind.
    pub fn render(self, statement: &SelectStatement) -> BuiltQuery {
        let (sql, values) = match self {
            Dialect::Postgres => statement.build(PostgresQueryBuilder),
            Dialect::Sqlite => statement.build(SqliteQueryBuilder),
        };
        BuiltQuery { sql, values }
    }
}

/// Rendered statement with placeholders and its bound values.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub sql: String,
    pub values: Values,
}

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("query exceeded {0:?}")]
    Timeout(Duration),

    #[error("cannot bind value: {0}")]
    Bind(String),
}

/// Executes rendered list statements.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Dialect statements must be rendered in.
    fn dialect(&self) -> Dialect;

    /// Run a `SELECT COUNT(*)` statement.
    async fn count(&self, query: &BuiltQuery) -> Result<u64, StoreError>;

    /// Run a statement and return each row as a JSON object.
    async fn fetch_all(&self, query: &BuiltQuery) -> Result<Vec<JsonValue>, StoreError>;

    /// Run the count and page statements of one list call.
    async fn fetch_page(
        &self,
        count: &BuiltQuery,
        page: &BuiltQuery,
    ) -> Result<(u64, Vec<JsonValue>), StoreError> {
        let total = self.count(count).await?;
        let rows = self.fetch_all(page).await?;
        Ok((total, rows))
    }

    /// Whether the store answers `SELECT 1`.
    async fn ping(&self) -> bool;
}

/// Bound a storage call by `limit`.
pub(crate) async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}

/// Convert a COUNT(*) result into a row count.
fn row_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}
