//! In-process cache of list results.
//!
//! Keys are the normalized request (see [`ListRequest::cache_key`]), so two
//! requests that differ only in ignored or defaulted parameters share an
//! entry.
//!
//! [`ListRequest::cache_key`]: super::resource::ListRequest::cache_key

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use super::types::ListResult;

/// TTL-bounded cache in front of the list service.
#[derive(Clone)]
pub struct ListCache {
    inner: Cache<String, Arc<ListResult>>,
}

impl ListCache {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self { inner }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<ListResult>> {
        let hit = self.inner.get(key).await;
        if hit.is_some() {
            debug!(key = %key, "list cache hit");
        }
        hit
    }

    pub async fn insert(&self, key: String, result: Arc<ListResult>) {
        self.inner.insert(key, result).await;
    }

    /// Drop every cached page of one resource.
    pub fn invalidate_resource(&self, resource: &str) {
        let prefix = resource_prefix(resource);
        if let Err(e) = self
            .inner
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
        {
            tracing::warn!(error = %e, resource = %resource, "failed to invalidate list cache");
        }
    }
}

/// Leading text of every cache key for `resource`.
fn resource_prefix(resource: &str) -> String {
    format!("[{},", serde_json::Value::from(resource))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::listing::params::ListParams;
    use crate::listing::resource::Resource;
    use crate::listing::types::SortDirection;

    fn key(resource: &str, page: u32) -> String {
        Resource::builder(resource, resource)
            .sort("id", "id")
            .default_sort("id", SortDirection::Asc)
            .build()
            .unwrap()
            .normalize(&ListParams::default().page(page), 100)
            .unwrap()
            .cache_key(resource)
    }

    #[test]
    fn keys_start_with_resource_prefix() {
        assert!(key("events", 1).starts_with(&resource_prefix("events")));
        assert!(!key("events_archive", 1).starts_with(&resource_prefix("events")));
    }

    #[tokio::test]
    async fn insert_then_get() {
        let cache = ListCache::new(Duration::from_secs(60), 100);
        let result = Arc::new(ListResult::empty(1, 10));

        cache.insert(key("events", 1), result.clone()).await;

        assert_eq!(cache.get(&key("events", 1)).await, Some(result));
        assert!(cache.get(&key("events", 2)).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_resource_keeps_others() {
        let cache = ListCache::new(Duration::from_secs(60), 100);
        cache
            .insert(key("events", 1), Arc::new(ListResult::empty(1, 10)))
            .await;
        cache
            .insert(key("careers", 1), Arc::new(ListResult::empty(1, 10)))
            .await;

        cache.invalidate_resource("events");
        cache.inner.run_pending_tasks().await;

        assert!(cache.get(&key("events", 1)).await.is_none());
        assert!(cache.get(&key("careers", 1)).await.is_some());
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = ListCache::new(Duration::from_millis(50), 100);
        cache
            .insert(key("events", 1), Arc::new(ListResult::empty(1, 10)))
            .await;

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get(&key("events", 1)).await.is_none());
    }
}
