//! Partners shown on the public site, in curated order.

use crate::listing::{Resource, ResourceError, SortDirection};

pub(super) fn resource() -> Result<Resource, ResourceError> {
    Resource::builder("partners", "partners")
        .searchable(&["name"])
        .sort("order", "display_order")
        .sort("name", "name")
        .default_sort("order", SortDirection::Asc)
        .tie_breaker("id")
        .build()
}
