//! List service.
//!
//! Executes a resource list call end to end:
//! normalize → build → count + page → booleans → enrich relations → decorate.

use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tracing::{debug, error};

use super::cache::ListCache;
use super::pager::DEFAULT_MAX_PAGE_SIZE;
use super::params::ListParams;
use super::query_builder::ListQueryBuilder;
use super::relation::{Relation, RelationKind};
use super::resource::Resource;
use super::types::{ListResult, Pagination, ValueKind};
use crate::store::{RowStore, StoreError};

/// Per-request list errors.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("invalid value for '{param}': expected {}", kind_name(.expected))]
    InvalidFilter { param: String, expected: ValueKind },

    #[error("query failed")]
    Store(#[from] StoreError),
}

fn kind_name(kind: &ValueKind) -> &'static str {
    match kind {
        ValueKind::Text => "text",
        ValueKind::Integer => "an integer",
        ValueKind::Boolean => "a boolean",
        ValueKind::Date => "a date",
    }
}

/// Runs list calls against a row store.
#[derive(Clone)]
pub struct ListService {
    store: Arc<dyn RowStore>,
    max_page_size: u32,
    cache: Option<ListCache>,
}

impl ListService {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self {
            store,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            cache: None,
        }
    }

    /// Upper bound on rows per page.
    pub fn with_max_page_size(mut self, max: u32) -> Self {
        self.max_page_size = max.max(1);
        self
    }

    /// Serve repeated requests from `cache`.
    pub fn with_cache(mut self, cache: ListCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn store(&self) -> &Arc<dyn RowStore> {
        &self.store
    }

    pub fn cache(&self) -> Option<&ListCache> {
        self.cache.as_ref()
    }

    /// List one page of `resource`.
    pub async fn list(
        &self,
        resource: &Resource,
        params: &ListParams,
    ) -> Result<ListResult, ListError> {
        let request = resource.normalize(params, self.max_page_size)?;

        let cache_key = self
            .cache
            .as_ref()
            .map(|_| request.cache_key(&resource.name));
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key)
            && let Some(hit) = cache.get(key).await
        {
            return Ok(hit.as_ref().clone());
        }

        let dialect = self.store.dialect();
        let builder = ListQueryBuilder::new(resource, &request, dialect);
        let count = dialect.render(&builder.build_count());
        let page = dialect.render(&builder.build_page());

        debug!(
            resource = %resource.name,
            count_sql = %count.sql,
            page_sql = %page.sql,
            "executing list query"
        );

        let (total, mut items) = self
            .store
            .fetch_page(&count, &page)
            .await
            .inspect_err(|e| error!(resource = %resource.name, error = %e, "list query failed"))?;

        if !resource.booleans.is_empty() {
            for item in &mut items {
                if let JsonValue::Object(row) = item {
                    coerce_booleans(row, &resource.booleans);
                }
            }
        }

        self.enrich(resource, &mut items).await?;

        if let Some(decorate) = resource.decorator {
            for item in &mut items {
                if let JsonValue::Object(row) = item {
                    decorate(row);
                }
            }
        }

        let result = ListResult {
            items,
            pagination: Pagination::new(total, request.window.page, request.window.page_size),
        };

        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
            cache.insert(key, Arc::new(result.clone())).await;
        }

        Ok(result)
    }

    /// Attach every relation to every row, in place.
    ///
    /// Rows are only decorated; their number and order never change.
    async fn enrich(&self, resource: &Resource, items: &mut [JsonValue]) -> Result<(), ListError> {
        if resource.relations.is_empty() {
            return Ok(());
        }

        for item in items.iter_mut() {
            for relation in &resource.relations {
                let value = self.fetch_relation(resource, relation, item).await?;
                if let JsonValue::Object(row) = item {
                    row.insert(relation.name.clone(), value);
                }
            }
        }

        Ok(())
    }

    async fn fetch_relation(
        &self,
        resource: &Resource,
        relation: &Relation,
        row: &JsonValue,
    ) -> Result<JsonValue, ListError> {
        let Some(parent) = relation.parent_value(row) else {
            return Ok(relation.empty_value());
        };

        let query = self.store.dialect().render(&relation.build_statement(parent));
        debug!(
            resource = %resource.name,
            relation = %relation.name,
            sql = %query.sql,
            "fetching relation"
        );

        let value = match relation.kind {
            RelationKind::Many => self.store.fetch_all(&query).await.map(JsonValue::Array),
            RelationKind::Count => self.store.count(&query).await.map(JsonValue::from),
        }
        .inspect_err(|e| {
            error!(
                resource = %resource.name,
                relation = %relation.name,
                error = %e,
                "relation query failed"
            );
        })?;

        Ok(value)
    }
}

/// Turn integer flags into JSON booleans; other values are left alone.
fn coerce_booleans(row: &mut Map<String, JsonValue>, keys: &[String]) {
    for key in keys {
        if let Some(value) = row.get_mut(key)
            && let Some(n) = value.as_i64()
        {
            *value = JsonValue::Bool(n != 0);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_flags_become_booleans() {
        let mut row = json!({"published": 1, "is_active": 0, "featured": true, "deleted": 1, "note": null})
            .as_object()
            .cloned()
            .unwrap();
        let keys = vec![
            "published".to_string(),
            "is_active".to_string(),
            "featured".to_string(),
            "note".to_string(),
        ];

        coerce_booleans(&mut row, &keys);

        assert_eq!(
            JsonValue::Object(row),
            json!({"published": true, "is_active": false, "featured": true, "deleted": 1, "note": null})
        );
    }
}
