//! Raw list request parameters.

use std::collections::{BTreeMap, HashMap};

/// Keys that are never treated as filters.
pub(crate) const RESERVED_PARAMS: &[&str] = &["page", "pageSize", "page_size", "limit", "sort", "order", "search"];

/// Unvalidated list parameters as they arrive from the query string.
///
/// Numbers stay as strings so malformed values fall back to defaults
/// during normalization instead of failing extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,

    /// Every other key; only those the resource declares are applied.
    pub filters: BTreeMap<String, String>,
}

impl ListParams {
    /// Split a raw query map into paging, sorting, search and filter keys.
    ///
    /// `pageSize` wins over `page_size`, which wins over `limit`.
    pub fn from_query(mut query: HashMap<String, String>) -> Self {
        let page_size = query
            .remove("pageSize")
            .or_else(|| query.remove("page_size"))
            .or_else(|| query.remove("limit"));

        let mut params = Self {
            page: query.remove("page"),
            page_size,
            sort: query.remove("sort"),
            order: query.remove("order"),
            search: query.remove("search"),
            filters: BTreeMap::new(),
        };

        params.filters = query
            .into_iter()
            .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str()))
            .collect();

        params
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page.to_string());
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size.to_string());
        self
    }

    pub fn sort(mut self, key: &str, order: &str) -> Self {
        self.sort = Some(key.to_string());
        self.order = Some(order.to_string());
        self
    }

    pub fn search(mut self, needle: &str) -> Self {
        self.search = Some(needle.to_string());
        self
    }

    pub fn filter(mut self, key: &str, value: &str) -> Self {
        self.filters.insert(key.to_string(), value.to_string());
        self
    }
}
