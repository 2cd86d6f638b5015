//! Projects of the internal tracker, with member and task counts.

use serde_json::{Map, Value as JsonValue};

use crate::listing::{FilterField, Literal, Relation, Resource, ResourceError, SortDirection};

/// Task status counted as done.
const COMPLETED: &str = "COMPLETED";

pub(super) fn resource() -> Result<Resource, ResourceError> {
    Resource::builder("projects", "projects")
        .condition("deleted", Literal::Integer(0))
        .searchable(&["title", "description"])
        .filter(FilterField::equals("status", "status"))
        .filter(FilterField::equals("owner", "owner_id"))
        .sort("createdAt", "created_at")
        .sort("dueDate", "due_date")
        .sort("title", "title")
        .default_sort("createdAt", SortDirection::Desc)
        .tie_breaker("id")
        .relation(Relation::count("member_count", "project_members", "project_id"))
        .relation(
            Relation::count("task_count", "tasks", "project_id")
                .where_eq("deleted", Literal::Integer(0)),
        )
        .relation(
            Relation::count("completed_task_count", "tasks", "project_id")
                .where_eq("deleted", Literal::Integer(0))
                .where_eq("status", Literal::Text(COMPLETED.to_string())),
        )
        .decorator(project_progress)
        .build()
}

/// Set `progress` to the rounded share of completed tasks, 0 without tasks.
pub fn project_progress(row: &mut Map<String, JsonValue>) {
    let count = |key: &str| row.get(key).and_then(JsonValue::as_u64).unwrap_or(0);
    let total = count("task_count");
    let done = count("completed_task_count").min(total);

    let progress = if total == 0 {
        0
    } else {
        (done * 100 + total / 2) / total
    };
    row.insert("progress".to_string(), JsonValue::from(progress));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn progress(task_count: u64, completed: u64) -> JsonValue {
        let mut row = json!({"task_count": task_count, "completed_task_count": completed});
        if let JsonValue::Object(map) = &mut row {
            project_progress(map);
        }
        row["progress"].clone()
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        assert_eq!(progress(3, 1), json!(33));
        assert_eq!(progress(3, 2), json!(67));
        assert_eq!(progress(8, 1), json!(13));
        assert_eq!(progress(4, 4), json!(100));
    }

    #[test]
    fn progress_is_zero_without_tasks() {
        assert_eq!(progress(0, 0), json!(0));

        let mut row = Map::new();
        project_progress(&mut row);
        assert_eq!(row["progress"], json!(0));
    }
}
