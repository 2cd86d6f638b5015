//! Configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// Database connection URL (`postgres://…` or `sqlite:…`).
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Upper bound on rows per list page (default: 100).
    pub max_page_size: u32,

    /// Time limit for one storage call (default: 10s).
    pub query_timeout: Duration,

    /// List cache TTL; zero disables the cache (default: 0).
    pub list_cache_ttl: Duration,

    /// Maximum cached list pages (default: 1000).
    pub list_cache_capacity: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "PORT", 3000u16).context("PORT must be a valid u16")?;

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL environment variable is required")?;

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        let max_page_size = parse_or(&lookup, "MAX_PAGE_SIZE", 100u32)
            .context("MAX_PAGE_SIZE must be a valid u32")?;
        if max_page_size == 0 {
            anyhow::bail!("MAX_PAGE_SIZE must be at least 1");
        }

        let query_timeout = parse_or(&lookup, "QUERY_TIMEOUT_SECS", 10u64)
            .context("QUERY_TIMEOUT_SECS must be a valid u64")?;
        if query_timeout == 0 {
            anyhow::bail!("QUERY_TIMEOUT_SECS must be at least 1");
        }

        let list_cache_ttl = parse_or(&lookup, "LIST_CACHE_TTL_SECS", 0u64)
            .context("LIST_CACHE_TTL_SECS must be a valid u64")?;

        let list_cache_capacity = parse_or(&lookup, "LIST_CACHE_CAPACITY", 1000u64)
            .context("LIST_CACHE_CAPACITY must be a valid u64")?;

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            cors_allowed_origins,
            max_page_size,
            query_timeout: Duration::from_secs(query_timeout),
            list_cache_ttl: Duration::from_secs(list_cache_ttl),
            list_cache_capacity,
        })
    }

    /// Whether list results should be cached.
    pub fn list_cache_enabled(&self) -> bool {
        !self.list_cache_ttl.is_zero() && self.list_cache_capacity > 0
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => Ok(raw.trim().parse()?),
        None => Ok(default),
    }
}
