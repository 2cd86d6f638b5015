//! Careers: job and internship postings.

use crate::listing::{FilterField, Resource, ResourceError, SortDirection};

pub(super) fn resource() -> Result<Resource, ResourceError> {
    Resource::builder("careers", "careers")
        .booleans(&["is_active"])
        .searchable(&["title", "description", "location"])
        .filter(FilterField::equals("type", "type"))
        .filter(FilterField::boolean("active", "is_active"))
        .filter(FilterField::contains("location", "location"))
        .sort("postedDate", "posted_date")
        .sort("deadline", "deadline")
        .sort("title", "title")
        .sort("createdAt", "created_at")
        .default_sort("createdAt", SortDirection::Desc)
        .tie_breaker("id")
        .build()
}
