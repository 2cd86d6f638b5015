//! Tasks of the project tracker.

use crate::listing::{FilterField, Literal, Resource, ResourceError, SortDirection};

pub(super) fn resource() -> Result<Resource, ResourceError> {
    Resource::builder("tasks", "tasks")
        .condition("deleted", Literal::Integer(0))
        .searchable(&["title", "description"])
        .filter(FilterField::equals("status", "status"))
        .filter(FilterField::equals("priority", "priority"))
        .filter(FilterField::equals("assignedTo", "assigned_to"))
        .filter(FilterField::equals("agentId", "agent_id"))
        .filter(FilterField::integer("project", "project_id"))
        .filter(FilterField::contains("tag", "tags"))
        .sort("createdAt", "created_at")
        .sort("dueDate", "due_date")
        .sort("priority", "priority")
        .sort("title", "title")
        .default_sort("createdAt", SortDirection::Desc)
        .tie_breaker("id")
        .build()
}
