//! List engine.
//!
//! Builds filtered, sorted, paginated read queries over declared resources
//! and returns `{ items, pagination }`:
//! - Resource descriptors with allow-listed filters and sort keys
//! - Parameter-bound predicates and case-insensitive search
//! - COUNT query sharing the page predicate
//! - Per-row relation enrichment and row decorators
//! - Optional TTL cache keyed by the normalized request

pub mod cache;
pub mod pager;
pub mod params;
pub mod query_builder;
pub mod relation;
pub mod resource;
pub mod service;
pub mod types;

pub use cache::ListCache;
pub use pager::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE, PageWindow};
pub use params::ListParams;
pub use query_builder::ListQueryBuilder;
pub use relation::{Relation, RelationKind};
pub use resource::{ListRequest, Resource, ResourceBuilder, ResourceError, RowDecorator};
pub use service::{ListError, ListService};
pub use types::{
    ColumnRef, Comparison, FilterField, ListResult, Literal, Pagination, SortDirection, SortField,
    ValueKind,
};
