//! Child collections attached to each row of a page.
//!
//! Relations run after the page query, one query per row and relation
//! (bounded by the page size). A batched `WHERE key IN (...)` variant can
//! replace this without changing what callers see.

use sea_query::{Alias, Asterisk, Expr, Query, SelectStatement};
use serde_json::Value as JsonValue;

use super::types::{ColumnRef, Condition, Literal, SortDirection};

/// Shape of the value attached to the parent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Array of child rows.
    Many,
    /// Number of child rows.
    Count,
}

/// Pivot table linking the parent to the target rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Through {
    /// Pivot table name.
    pub table: String,

    /// Pivot column referencing the target's primary key.
    pub target_key: String,

    /// Target primary key column.
    pub target_pk: String,

    /// Pivot columns copied into each child row, as `(column, output alias)`.
    pub select: Vec<(String, String)>,
}

/// A child collection declared on a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    /// Key the children are attached under.
    pub name: String,

    pub kind: RelationKind,

    /// Table the children are read from.
    pub table: String,

    /// Column compared against the parent's key.
    pub key: ColumnRef,

    /// Field of the parent row holding its key (default "id").
    pub parent_key: String,

    pub through: Option<Through>,

    /// Target columns to select; empty selects every column.
    pub columns: Vec<String>,

    /// Fixed predicates (e.g. soft-delete flags).
    pub conditions: Vec<Condition>,

    /// Display order of the children.
    pub order: Option<(ColumnRef, SortDirection)>,
}

impl Relation {
    /// Child rows with `table.foreign_key = parent.id`.
    pub fn many(name: &str, table: &str, foreign_key: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: RelationKind::Many,
            table: table.to_string(),
            key: ColumnRef::on(table, foreign_key),
            parent_key: "id".to_string(),
            through: None,
            columns: Vec::new(),
            conditions: Vec::new(),
            order: None,
        }
    }

    /// Rows of `target` linked through a pivot table.
    ///
    /// `pivot_parent_key` references the parent, `pivot_target_key`
    /// references `target.id`.
    pub fn through(
        name: &str,
        target: &str,
        pivot: &str,
        pivot_parent_key: &str,
        pivot_target_key: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind: RelationKind::Many,
            table: target.to_string(),
            key: ColumnRef::on(pivot, pivot_parent_key),
            parent_key: "id".to_string(),
            through: Some(Through {
                table: pivot.to_string(),
                target_key: pivot_target_key.to_string(),
                target_pk: "id".to_string(),
                select: Vec::new(),
            }),
            columns: Vec::new(),
            conditions: Vec::new(),
            order: None,
        }
    }

    /// Number of rows in `table` with `foreign_key = parent.id`.
    pub fn count(name: &str, table: &str, foreign_key: &str) -> Self {
        Self {
            kind: RelationKind::Count,
            ..Self::many(name, table, foreign_key)
        }
    }

    /// Restrict the selected target columns.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Copy pivot columns into each child row.
    pub fn pivot_columns(mut self, columns: &[(&str, &str)]) -> Self {
        if let Some(through) = self.through.as_mut() {
            through.select = columns
                .iter()
                .map(|(c, a)| (c.to_string(), a.to_string()))
                .collect();
        }
        self
    }

    /// Add a fixed predicate on the child table.
    pub fn where_eq(mut self, column: &str, value: Literal) -> Self {
        self.conditions.push(Condition {
            column: ColumnRef::on(&self.table, column),
            value,
        });
        self
    }

    /// Order children by a column of the target table.
    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order = Some((ColumnRef::on(&self.table, column), direction));
        self
    }

    /// Order children by a column of the pivot table.
    pub fn order_by_pivot(mut self, column: &str, direction: SortDirection) -> Self {
        if let Some(pivot) = self.through.as_ref().map(|t| t.table.clone()) {
            self.order = Some((ColumnRef::on(&pivot, column), direction));
        }
        self
    }

    /// Read the parent's key from a row, if it is a usable scalar.
    pub fn parent_value(&self, row: &JsonValue) -> Option<sea_query::Value> {
        match row.get(&self.parent_key)? {
            JsonValue::Number(n) => n.as_i64().map(Into::into),
            JsonValue::String(s) => Some(s.clone().into()),
            _ => None,
        }
    }

    /// Value attached when the parent has no usable key.
    pub fn empty_value(&self) -> JsonValue {
        match self.kind {
            RelationKind::Many => JsonValue::Array(Vec::new()),
            RelationKind::Count => JsonValue::from(0),
        }
    }

    /// Build the child query for one parent key.
    pub fn build_statement(&self, parent: sea_query::Value) -> SelectStatement {
        let mut query = Query::select();
        let table = Alias::new(&self.table);

        match self.kind {
            RelationKind::Count => {
                query.expr(Expr::col(Asterisk).count());
            }
            RelationKind::Many => {
                if self.columns.is_empty() {
                    query.column((table.clone(), Asterisk));
                } else {
                    for column in &self.columns {
                        query.column((table.clone(), Alias::new(column)));
                    }
                }
                if let Some(through) = &self.through {
                    for (column, alias) in &through.select {
                        query.expr_as(
                            Expr::col((Alias::new(&through.table), Alias::new(column))),
                            Alias::new(alias),
                        );
                    }
                }
            }
        }

        query.from(table.clone());

        if let Some(through) = &self.through {
            query.inner_join(
                Alias::new(&through.table),
                Expr::col((Alias::new(&through.table), Alias::new(&through.target_key)))
                    .equals((table.clone(), Alias::new(&through.target_pk))),
            );
        }

        query.and_where(Expr::col(column_ref(&self.key, &self.table)).eq(parent));

        for condition in &self.conditions {
            let value: sea_query::Value = condition.value.clone().into();
            query.and_where(Expr::col(column_ref(&condition.column, &self.table)).eq(value));
        }

        if self.kind == RelationKind::Many
            && let Some((column, direction)) = &self.order
        {
            query.order_by(column_ref(column, &self.table), (*direction).into());
        }

        query
    }
}

fn column_ref(column: &ColumnRef, table: &str) -> (Alias, Alias) {
    (
        Alias::new(column.table_or(table)),
        Alias::new(&column.name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::SqliteQueryBuilder;

    #[test]
    fn through_relation_joins_pivot_and_orders() {
        let relation = Relation::through(
            "speakers",
            "speakers",
            "event_speakers",
            "event_id",
            "speaker_id",
        )
        .columns(&["id", "first_name"])
        .pivot_columns(&[("role", "role")])
        .order_by_pivot("display_order", SortDirection::Asc);

        let (sql, values) = relation
            .build_statement(7i64.into())
            .build(SqliteQueryBuilder);

        assert!(sql.contains(r#"INNER JOIN "event_speakers""#), "{sql}");
        assert!(
            sql.contains(r#""event_speakers"."speaker_id" = "speakers"."id""#),
            "{sql}"
        );
        assert!(sql.contains(r#""event_speakers"."event_id" = ?"#), "{sql}");
        assert!(
            sql.contains(r#"ORDER BY "event_speakers"."display_order" ASC"#),
            "{sql}"
        );
        assert!(sql.contains(r#""event_speakers"."role" AS "role""#), "{sql}");
        assert_eq!(values.0.len(), 1);
    }

    #[test]
    fn count_relation_binds_conditions() {
        let relation = Relation::count("task_count", "tasks", "project_id")
            .where_eq("deleted", Literal::Integer(0))
            .order_by("title", SortDirection::Asc);

        let (sql, values) = relation
            .build_statement(3i64.into())
            .build(SqliteQueryBuilder);

        assert!(sql.starts_with("SELECT COUNT(*)"), "{sql}");
        assert!(sql.contains(r#""tasks"."project_id" = ?"#), "{sql}");
        assert!(sql.contains(r#""tasks"."deleted" = ?"#), "{sql}");
        assert!(!sql.contains("ORDER BY"), "counts are unordered: {sql}");
        assert_eq!(values.0.len(), 2);
    }

    #[test]
    fn parent_value_accepts_numbers_and_strings() {
        let relation = Relation::many("files", "task_files", "task_id");

        assert!(relation.parent_value(&serde_json::json!({"id": 5})).is_some());
        assert!(relation.parent_value(&serde_json::json!({"id": "p-1"})).is_some());
        assert!(relation.parent_value(&serde_json::json!({"id": null})).is_none());
        assert!(relation.parent_value(&serde_json::json!({"title": "x"})).is_none());
    }

    #[test]
    fn empty_value_matches_kind() {
        assert_eq!(
            Relation::many("tags", "tags", "event_id").empty_value(),
            serde_json::json!([])
        );
        assert_eq!(
            Relation::count("n", "tasks", "project_id").empty_value(),
            serde_json::json!(0)
        );
    }
}
