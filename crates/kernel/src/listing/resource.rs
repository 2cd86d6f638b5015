//! Resource descriptors and request normalization.
//!
//! A [`Resource`] declares everything the engine may touch for one
//! collection: which columns it selects, which request keys filter it, which
//! keys it sorts by. Anything a request names outside these lists is either
//! ignored or replaced by a default; nothing from the request reaches SQL
//! text except identifiers chosen from the descriptor.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use super::pager::{DEFAULT_PAGE_SIZE, PageWindow};
use super::params::{ListParams, RESERVED_PARAMS};
use super::relation::Relation;
use super::service::ListError;
use super::types::{
    ColumnRef, Comparison, Condition, FilterField, Join, Literal, SortDirection, SortField,
    ValueKind,
};

/// Plain SQL identifier.
static IDENTIFIER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok());

fn is_identifier(value: &str) -> bool {
    IDENTIFIER.as_ref().is_some_and(|re| re.is_match(value))
}

/// Function run on every row after enrichment.
pub type RowDecorator = fn(&mut Map<String, JsonValue>);

/// Resource misconfiguration, detected when the descriptor is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("resource '{resource}': '{identifier}' is not a valid SQL identifier")]
    InvalidIdentifier { resource: String, identifier: String },

    #[error("resource '{resource}' declares no sortable fields")]
    NoSortableFields { resource: String },

    #[error("resource '{resource}': default sort '{key}' is not sortable")]
    UnknownDefaultSort { resource: String, key: String },

    #[error("resource '{resource}': duplicate filter '{param}'")]
    DuplicateFilter { resource: String, param: String },

    #[error("resource '{resource}': filter '{param}' shadows a reserved parameter")]
    ReservedFilter { resource: String, param: String },

    #[error("resource '{resource}': duplicate sort key '{key}'")]
    DuplicateSort { resource: String, key: String },

    #[error("resource '{resource}': default page size must be at least 1")]
    ZeroPageSize { resource: String },

    #[error("resource '{resource}': '{name}' collides with another output key")]
    NameCollision { resource: String, name: String },

    #[error("resource '{resource}': column references unknown table '{table}'")]
    UnknownTable { resource: String, table: String },

    #[error("resource '{resource}': filter '{param}' matches substrings of a non-text value")]
    InvalidComparison { resource: String, param: String },

    #[error("resource '{resource}': relation '{relation}' reads '{key}', which no row selects")]
    MissingParentKey {
        resource: String,
        relation: String,
        key: String,
    },

    #[error("resource '{resource}': envelope key must not be empty")]
    EmptyEnvelope { resource: String },

    #[error("duplicate resource '{0}'")]
    DuplicateResource(String),
}

/// Validated descriptor of a listable collection.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Collection name used in routes and cache keys.
    pub name: String,

    /// Base table.
    pub table: String,

    /// JSON key of the rows array in HTTP responses.
    pub envelope: String,

    /// Selected base-table columns; empty selects `table.*`.
    pub columns: Vec<ColumnRef>,

    /// Output keys holding booleans stored as integers.
    pub booleans: Vec<String>,

    pub joins: Vec<Join>,
    pub conditions: Vec<Condition>,
    pub filters: Vec<FilterField>,
    pub searchable: Vec<ColumnRef>,
    pub sortable: Vec<SortField>,
    pub default_sort: String,
    pub default_direction: SortDirection,

    /// Unique column appended as secondary ORDER BY.
    pub tie_breaker: Option<ColumnRef>,

    pub default_page_size: u32,
    pub relations: Vec<Relation>,
    pub decorator: Option<RowDecorator>,
}

/// Builder for [`Resource`].
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    inner: Resource,
}

impl Resource {
    /// Start describing a collection read from `table`.
    pub fn builder(name: &str, table: &str) -> ResourceBuilder {
        ResourceBuilder {
            inner: Resource {
                name: name.to_string(),
                table: table.to_string(),
                envelope: name.to_string(),
                columns: Vec::new(),
                booleans: Vec::new(),
                joins: Vec::new(),
                conditions: Vec::new(),
                filters: Vec::new(),
                searchable: Vec::new(),
                sortable: Vec::new(),
                default_sort: String::new(),
                default_direction: SortDirection::Asc,
                tie_breaker: None,
                default_page_size: DEFAULT_PAGE_SIZE,
                relations: Vec::new(),
                decorator: None,
            },
        }
    }

    /// Look up a sort key in the allow-list.
    pub fn sort_field(&self, key: &str) -> Option<&SortField> {
        self.sortable.iter().find(|s| s.key == key)
    }

    /// Turn raw parameters into a validated request.
    ///
    /// Paging and sorting never fail: bad values fall back to defaults.
    /// A typed filter whose value does not parse is rejected.
    pub fn normalize(&self, params: &ListParams, max_page_size: u32) -> Result<ListRequest, ListError> {
        let window = PageWindow::resolve(
            params.page.as_deref(),
            params.page_size.as_deref(),
            self.default_page_size,
            max_page_size,
        );
        if window.clamped {
            tracing::warn!(
                resource = %self.name,
                requested = ?params.page_size,
                page_size = window.page_size,
                "page size clamped"
            );
        }

        let requested = params.sort.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let sort = match requested.and_then(|key| self.sort_field(key)) {
            Some(field) => field.clone(),
            None => {
                if let Some(key) = requested {
                    tracing::warn!(resource = %self.name, sort = key, "sort key rejected, using default");
                }
                self.default_sort_field()
            }
        };

        let direction = params
            .order
            .as_deref()
            .and_then(SortDirection::parse)
            .unwrap_or(self.default_direction);

        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !self.searchable.is_empty())
            .map(str::to_string);

        let mut filters = Vec::new();
        for field in &self.filters {
            let Some(raw) = params.filters.get(&field.param) else {
                continue;
            };
            if field.is_inert(raw) {
                continue;
            }
            let value = field.parse(raw).ok_or_else(|| ListError::InvalidFilter {
                param: field.param.clone(),
                expected: field.kind,
            })?;
            filters.push(AppliedFilter {
                field: field.clone(),
                value,
            });
        }

        Ok(ListRequest {
            window,
            sort,
            direction,
            search,
            filters,
        })
    }

    fn default_sort_field(&self) -> SortField {
        self.sort_field(&self.default_sort)
            .cloned()
            .unwrap_or_else(|| SortField::new(&self.default_sort, &self.default_sort))
    }
}

impl ResourceBuilder {
    /// JSON key of the rows array (defaults to the resource name).
    pub fn envelope(mut self, key: &str) -> Self {
        self.inner.envelope = key.to_string();
        self
    }

    /// Select base-table columns.
    pub fn columns(mut self, names: &[&str]) -> Self {
        self.inner.columns.extend(names.iter().map(|name| ColumnRef::base(name)));
        self
    }

    /// Output keys rendered as JSON booleans.
    ///
    /// SQLite has no boolean type and hands these back as `0`/`1`.
    pub fn booleans(mut self, keys: &[&str]) -> Self {
        self.inner.booleans.extend(keys.iter().map(|k| k.to_string()));
        self
    }

    /// LEFT JOIN a to-one lookup table and select some of its columns.
    pub fn lookup(
        mut self,
        table: &str,
        alias: &str,
        local_column: &str,
        select: &[(&str, &str)],
    ) -> Self {
        self.inner.joins.push(Join {
            table: table.to_string(),
            alias: alias.to_string(),
            local_column: local_column.to_string(),
            foreign_column: "id".to_string(),
            select: select
                .iter()
                .map(|(c, a)| (c.to_string(), a.to_string()))
                .collect(),
        });
        self
    }

    /// Predicate applied to every query.
    pub fn condition(mut self, column: &str, value: Literal) -> Self {
        self.inner.conditions.push(Condition {
            column: ColumnRef::base(column),
            value,
        });
        self
    }

    pub fn filter(mut self, field: FilterField) -> Self {
        self.inner.filters.push(field);
        self
    }

    /// Columns matched by the `search` parameter.
    pub fn searchable(mut self, columns: &[&str]) -> Self {
        self.inner
            .searchable
            .extend(columns.iter().map(|c| ColumnRef::base(c)));
        self
    }

    /// Allow ordering by `column` under the request key `key`.
    pub fn sort(mut self, key: &str, column: &str) -> Self {
        self.inner.sortable.push(SortField::new(key, column));
        self
    }

    pub fn default_sort(mut self, key: &str, direction: SortDirection) -> Self {
        self.inner.default_sort = key.to_string();
        self.inner.default_direction = direction;
        self
    }

    pub fn tie_breaker(mut self, column: &str) -> Self {
        self.inner.tie_breaker = Some(ColumnRef::base(column));
        self
    }

    pub fn default_page_size(mut self, size: u32) -> Self {
        self.inner.default_page_size = size;
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.inner.relations.push(relation);
        self
    }

    pub fn decorator(mut self, decorator: RowDecorator) -> Self {
        self.inner.decorator = Some(decorator);
        self
    }

    /// Validate and freeze the descriptor.
    pub fn build(self) -> Result<Resource, ResourceError> {
        let resource = self.inner;
        let name = resource.name.clone();

        if resource.envelope.trim().is_empty() {
            return Err(ResourceError::EmptyEnvelope { resource: name });
        }
        if resource.default_page_size == 0 {
            return Err(ResourceError::ZeroPageSize { resource: name });
        }

        // Every identifier that can reach SQL text.
        let mut identifiers: Vec<&str> = vec![resource.table.as_str()];
        identifiers.extend(resource.columns.iter().map(|c| c.name.as_str()));
        identifiers.extend(resource.booleans.iter().map(String::as_str));
        for join in &resource.joins {
            identifiers.extend([
                join.table.as_str(),
                join.alias.as_str(),
                join.local_column.as_str(),
                join.foreign_column.as_str(),
            ]);
            for (column, alias) in &join.select {
                identifiers.extend([column.as_str(), alias.as_str()]);
            }
        }
        identifiers.extend(resource.conditions.iter().map(|c| c.column.name.as_str()));
        identifiers.extend(resource.filters.iter().map(|f| f.column.name.as_str()));
        identifiers.extend(resource.searchable.iter().map(|c| c.name.as_str()));
        identifiers.extend(resource.sortable.iter().map(|s| s.column.name.as_str()));
        identifiers.extend(resource.tie_breaker.iter().map(|c| c.name.as_str()));
        for relation in &resource.relations {
            identifiers.extend([
                relation.table.as_str(),
                relation.key.name.as_str(),
                relation.parent_key.as_str(),
            ]);
            identifiers.extend(relation.key.table.as_deref());
            identifiers.extend(relation.columns.iter().map(String::as_str));
            identifiers.extend(relation.conditions.iter().map(|c| c.column.name.as_str()));
            identifiers.extend(relation.order.iter().map(|(c, _)| c.name.as_str()));
            if let Some(through) = &relation.through {
                identifiers.extend([
                    through.table.as_str(),
                    through.target_key.as_str(),
                    through.target_pk.as_str(),
                ]);
                for (column, alias) in &through.select {
                    identifiers.extend([column.as_str(), alias.as_str()]);
                }
            }
        }
        if let Some(bad) = identifiers.into_iter().find(|id| !is_identifier(id)) {
            return Err(ResourceError::InvalidIdentifier {
                resource: name,
                identifier: bad.to_string(),
            });
        }

        // Qualified columns must point at the base table or a join alias.
        let known_tables: HashSet<&str> = std::iter::once(resource.table.as_str())
            .chain(resource.joins.iter().map(|j| j.alias.as_str()))
            .collect();
        let qualified = resource
            .columns
            .iter()
            .chain(resource.conditions.iter().map(|c| &c.column))
            .chain(resource.filters.iter().map(|f| &f.column))
            .chain(resource.searchable.iter())
            .chain(resource.sortable.iter().map(|s| &s.column))
            .chain(resource.tie_breaker.iter());
        for column in qualified {
            if let Some(table) = column.table.as_deref()
                && !known_tables.contains(table)
            {
                return Err(ResourceError::UnknownTable {
                    resource: name,
                    table: table.to_string(),
                });
            }
        }

        let mut params = HashSet::new();
        for filter in &resource.filters {
            if RESERVED_PARAMS.contains(&filter.param.as_str()) {
                return Err(ResourceError::ReservedFilter {
                    resource: name,
                    param: filter.param.clone(),
                });
            }
            if !params.insert(filter.param.as_str()) {
                return Err(ResourceError::DuplicateFilter {
                    resource: name,
                    param: filter.param.clone(),
                });
            }
            if filter.comparison == Comparison::Contains && filter.kind != ValueKind::Text {
                return Err(ResourceError::InvalidComparison {
                    resource: name,
                    param: filter.param.clone(),
                });
            }
        }

        if resource.sortable.is_empty() {
            return Err(ResourceError::NoSortableFields { resource: name });
        }
        let mut keys = HashSet::new();
        for sort in &resource.sortable {
            if !keys.insert(sort.key.as_str()) {
                return Err(ResourceError::DuplicateSort {
                    resource: name,
                    key: sort.key.clone(),
                });
            }
        }
        if !keys.contains(resource.default_sort.as_str()) {
            return Err(ResourceError::UnknownDefaultSort {
                resource: name,
                key: resource.default_sort.clone(),
            });
        }

        // Output keys of one row: selected columns, join columns, relations.
        let mut outputs: HashSet<&str> = resource.columns.iter().map(|c| c.name.as_str()).collect();
        let lookups = resource
            .joins
            .iter()
            .flat_map(|j| j.select.iter().map(|(_, alias)| alias.as_str()));
        for output in lookups {
            if !outputs.insert(output) {
                return Err(ResourceError::NameCollision {
                    resource: name,
                    name: output.to_string(),
                });
            }
        }

        // With an explicit column list, relations can only read keys it selects.
        if !resource.columns.is_empty()
            && let Some(relation) = resource
                .relations
                .iter()
                .find(|r| !outputs.contains(r.parent_key.as_str()))
        {
            return Err(ResourceError::MissingParentKey {
                resource: name,
                relation: relation.name.clone(),
                key: relation.parent_key.clone(),
            });
        }

        for output in resource.relations.iter().map(|r| r.name.as_str()) {
            if !outputs.insert(output) {
                return Err(ResourceError::NameCollision {
                    resource: name,
                    name: output.to_string(),
                });
            }
        }
        let mut aliases = HashSet::new();
        for join in &resource.joins {
            if join.alias == resource.table || !aliases.insert(join.alias.as_str()) {
                return Err(ResourceError::NameCollision {
                    resource: name,
                    name: join.alias.clone(),
                });
            }
        }

        Ok(resource)
    }
}

/// A filter the request actually applies, with its parsed value.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedFilter {
    pub field: FilterField,
    pub value: Literal,
}

/// Validated, normalized list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub window: PageWindow,
    pub sort: SortField,
    pub direction: SortDirection,

    /// Trimmed search needle; `None` when absent or blank.
    pub search: Option<String>,

    /// Applied filters in the resource's declaration order.
    pub filters: Vec<AppliedFilter>,
}

impl ListRequest {
    /// Key identifying this request for `resource` in the result cache.
    pub fn cache_key(&self, resource: &str) -> String {
        let filters: Vec<JsonValue> = self
            .filters
            .iter()
            .map(|f| JsonValue::from(vec![f.field.param.clone(), f.value.as_key()]))
            .collect();
        serde_json::json!([
            resource,
            self.window.page,
            self.window.page_size,
            self.sort.key,
            self.direction.as_str(),
            self.search,
            filters,
        ])
        .to_string()
    }
}
