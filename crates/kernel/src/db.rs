//! Database connection pool management.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::config::Config;
use crate::store::{PgStore, RowStore, SqliteStore};

/// Connect to the configured database and wrap it in a row store.
///
/// The URL scheme selects the backend: `postgres://` / `postgresql://`
/// or `sqlite:`.
pub async fn create_store(config: &Config) -> Result<Arc<dyn RowStore>> {
    let url = config.database_url.as_str();

    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(url)
            .await
            .context("failed to connect to PostgreSQL")?;
        return Ok(Arc::new(PgStore::new(pool, config.query_timeout)));
    }

    if url.starts_with("sqlite:") {
        // REGEXP backs case-insensitive search on SQLite.
        let connect = SqliteConnectOptions::from_str(url)
            .context("invalid SQLite DATABASE_URL")?
            .with_regexp();
        let mut options = SqlitePoolOptions::new().max_connections(config.database_max_connections);
        // Each connection to `:memory:` is its own database; keep exactly one alive.
        if url.contains(":memory:") {
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options
            .connect_with(connect)
            .await
            .context("failed to open SQLite database")?;
        return Ok(Arc::new(SqliteStore::new(pool, config.query_timeout)));
    }

    anyhow::bail!("unsupported DATABASE_URL scheme (expected postgres:// or sqlite:)")
}
