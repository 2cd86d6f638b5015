//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::listing::{ListCache, ListService};
use crate::resources::ResourceCatalog;
use crate::store::RowStore;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Registered list resources.
    catalog: ResourceCatalog,

    /// List engine bound to the row store.
    lists: ListService,
}

impl AppState {
    /// Connect to storage and register the built-in resources.
    pub async fn new(config: &Config) -> Result<Self> {
        let store = db::create_store(config)
            .await
            .context("failed to create row store")?;
        info!(dialect = ?store.dialect(), "row store ready");

        let catalog = ResourceCatalog::builtin().context("invalid resource definition")?;
        info!(resources = catalog.len(), "resources registered");

        Ok(Self::from_parts(config, store, catalog))
    }

    /// Assemble state from an existing store and catalog.
    pub fn from_parts(config: &Config, store: Arc<dyn RowStore>, catalog: ResourceCatalog) -> Self {
        let mut lists = ListService::new(store).with_max_page_size(config.max_page_size);
        if config.list_cache_enabled() {
            info!(
                ttl_secs = config.list_cache_ttl.as_secs(),
                capacity = config.list_cache_capacity,
                "list cache enabled"
            );
            lists = lists.with_cache(ListCache::new(
                config.list_cache_ttl,
                config.list_cache_capacity,
            ));
        }

        Self {
            inner: Arc::new(AppStateInner { catalog, lists }),
        }
    }

    /// Get the resource catalog.
    pub fn catalog(&self) -> &ResourceCatalog {
        &self.inner.catalog
    }

    /// Get the list service.
    pub fn lists(&self) -> &ListService {
        &self.inner.lists
    }

    /// Check if the database is healthy.
    pub async fn store_healthy(&self) -> bool {
        self.inner.lists.store().ping().await
    }
}
