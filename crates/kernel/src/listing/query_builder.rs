//! List query builder using SeaQuery.
//!
//! Generates the page and count statements for a normalized request:
//! - to-one LEFT JOIN lookups
//! - bound filter and search predicates, matched per dialect
//! - allow-listed ORDER BY with a unique tie-breaker
//! - LIMIT/OFFSET pagination
//!
//! Statements are returned unrendered; the store renders them for its
//! backend so every value travels as a bound parameter.

use chrono::NaiveDateTime;
use sea_query::extension::postgres::PgExpr;
use sea_query::{Alias, Asterisk, Cond, Expr, Func, LikeExpr, Query, SelectStatement, SimpleExpr};

use super::resource::{AppliedFilter, ListRequest, Resource};
use super::types::{ColumnRef, Comparison, Literal};
use crate::store::Dialect;

/// Escape character used in LIKE patterns.
const LIKE_ESCAPE: char = '!';

/// Query builder for one list request.
pub struct ListQueryBuilder<'a> {
    resource: &'a Resource,
    request: &'a ListRequest,
    dialect: Dialect,
}

impl<'a> ListQueryBuilder<'a> {
    pub fn new(resource: &'a Resource, request: &'a ListRequest, dialect: Dialect) -> Self {
        Self {
            resource,
            request,
            dialect,
        }
    }

    /// Build the page query: columns, predicate, order and window.
    pub fn build_page(&self) -> SelectStatement {
        let mut query = Query::select();

        self.add_select_fields(&mut query);
        query.from(Alias::new(&self.resource.table));
        self.add_joins(&mut query);
        self.add_predicate(&mut query);
        self.add_sorts(&mut query);

        query.limit(u64::from(self.request.window.page_size));
        query.offset(self.request.window.offset());

        query
    }

    /// Build the COUNT query sharing the page query's predicate.
    pub fn build_count(&self) -> SelectStatement {
        let mut query = Query::select();

        query.expr(Expr::col(Asterisk).count());
        query.from(Alias::new(&self.resource.table));
        self.add_joins(&mut query);
        self.add_predicate(&mut query);

        query
    }

    fn col(&self, column: &ColumnRef) -> (Alias, Alias) {
        (
            Alias::new(column.table_or(&self.resource.table)),
            Alias::new(&column.name),
        )
    }

    fn add_select_fields(&self, query: &mut SelectStatement) {
        let base = Alias::new(&self.resource.table);

        if self.resource.columns.is_empty() {
            query.column((base, Asterisk));
        } else {
            for column in &self.resource.columns {
                query.column(self.col(column));
            }
        }

        for join in &self.resource.joins {
            for (column, alias) in &join.select {
                query.expr_as(
                    Expr::col((Alias::new(&join.alias), Alias::new(column))),
                    Alias::new(alias),
                );
            }
        }
    }

    fn add_joins(&self, query: &mut SelectStatement) {
        for join in &self.resource.joins {
            let on_condition = Expr::col((
                Alias::new(&self.resource.table),
                Alias::new(&join.local_column),
            ))
            .equals((Alias::new(&join.alias), Alias::new(&join.foreign_column)));

            query.join_as(
                sea_query::JoinType::LeftJoin,
                Alias::new(&join.table),
                Alias::new(&join.alias),
                on_condition,
            );
        }
    }

    /// Fixed conditions, then filters, then the search group, all ANDed.
    fn add_predicate(&self, query: &mut SelectStatement) {
        let mut cond = Cond::all();

        for condition in &self.resource.conditions {
            let value: sea_query::Value = condition.value.clone().into();
            cond = cond.add(Expr::col(self.col(&condition.column)).eq(value));
        }

        for filter in &self.request.filters {
            cond = cond.add(self.filter_expr(filter));
        }

        if let Some(needle) = &self.request.search {
            let mut any = Cond::any();
            for column in &self.resource.searchable {
                any = any.add(self.contains(column, needle));
            }
            cond = cond.add(any);
        }

        if !cond.is_empty() {
            query.cond_where(cond);
        }
    }

    fn filter_expr(&self, filter: &AppliedFilter) -> SimpleExpr {
        let column = self.col(&filter.field.column);

        // Contains is registered for text fields only.
        let (target, value) = match &filter.value {
            Literal::Text(needle) if filter.field.comparison == Comparison::Contains => {
                return self.contains(&filter.field.column, needle);
            }
            Literal::Timestamp(at) => (self.instant(column), self.date_value(at)),
            other => (Expr::col(column), literal(other)),
        };

        match filter.field.comparison {
            Comparison::AtLeast => target.gte(value),
            Comparison::AtMost => target.lte(value),
            Comparison::Equals | Comparison::Contains => target.eq(value),
        }
    }

    /// Case-insensitive substring match, Unicode-aware on both backends.
    ///
    /// PostgreSQL: `col ILIKE ? ESCAPE '!'`.
    /// SQLite: `COALESCE(col, '') REGEXP ?` with an escaped `(?i)` pattern.
    fn contains(&self, column: &ColumnRef, needle: &str) -> SimpleExpr {
        let column = Expr::col(self.col(column));
        match self.dialect {
            Dialect::Postgres => {
                let pattern = format!("%{}%", escape_like_wildcards(needle));
                column.ilike(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
            }
            Dialect::Sqlite => Expr::cust_with_exprs(
                "COALESCE($1, '') REGEXP $2",
                [
                    SimpleExpr::from(column),
                    Expr::val(format!("(?i){}", regex::escape(needle))).into(),
                ],
            ),
        }
    }

    /// Column as an instant; SQLite normalizes its text through `datetime()`.
    fn instant(&self, column: (Alias, Alias)) -> Expr {
        match self.dialect {
            Dialect::Postgres => Expr::col(column),
            Dialect::Sqlite => {
                Expr::expr(Func::cust(Alias::new("datetime")).arg(Expr::col(column)))
            }
        }
    }

    fn date_value(&self, at: &NaiveDateTime) -> sea_query::Value {
        match self.dialect {
            Dialect::Postgres => (*at).into(),
            Dialect::Sqlite => at.format("%Y-%m-%d %H:%M:%S").to_string().into(),
        }
    }

    fn add_sorts(&self, query: &mut SelectStatement) {
        let sort = &self.request.sort;
        query.order_by(self.col(&sort.column), self.request.direction.into());

        if let Some(tie) = &self.resource.tie_breaker
            && tie.name != sort.column.name
        {
            query.order_by(self.col(tie), self.request.direction.into());
        }
    }
}

fn literal(value: &Literal) -> sea_query::Value {
    value.clone().into()
}

/// Escape SQL LIKE wildcards in user input.
///
/// Prevents `%`, `_` and the escape character itself from acting as
/// pattern metacharacters.
pub fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('!', "!!")
        .replace('%', "!%")
        .replace('_', "!_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::listing::params::ListParams;
    use crate::listing::types::{FilterField, SortDirection};
    use sea_query::{PostgresQueryBuilder, SqliteQueryBuilder, Value, Values};

    fn publications() -> Resource {
        Resource::builder("publications", "publications")
            .columns(&["id", "title", "status"])
            .lookup("event_categories", "c", "category_id", &[("name", "category_name")])
            .condition("deleted", Literal::Integer(0))
            .searchable(&["title", "abstract"])
            .filter(FilterField::equals("status", "status").with_wildcard("all"))
            .filter(FilterField::integer("category", "category_id"))
            .filter(FilterField::on_or_after("from", "publication_date"))
            .filter(FilterField::contains("type", "type"))
            .sort("publicationDate", "publication_date")
            .sort("createdAt", "created_at")
            .default_sort("createdAt", SortDirection::Desc)
            .tie_breaker("id")
            .build()
            .unwrap()
    }

    fn page_sql(params: ListParams) -> (String, Values) {
        let resource = publications();
        let request = resource.normalize(&params, 100).unwrap();
        ListQueryBuilder::new(&resource, &request, Dialect::Postgres)
            .build_page()
            .build(PostgresQueryBuilder)
    }

    fn sqlite_page_sql(params: ListParams) -> (String, Values) {
        let resource = publications();
        let request = resource.normalize(&params, 100).unwrap();
        ListQueryBuilder::new(&resource, &request, Dialect::Sqlite)
            .build_page()
            .build(SqliteQueryBuilder)
    }

    fn has_string(values: &Values, expected: &str) -> bool {
        values.0.iter().any(|v| match v {
            Value::String(Some(s)) => s.as_str() == expected,
            _ => false,
        })
    }

    #[test]
    fn page_query_uses_placeholders_for_all_values() {
        let (sql, values) = page_sql(
            ListParams::default()
                .filter("status", "PUBLISHED")
                .filter("category", "3")
                .page(2)
                .page_size(10),
        );

        assert!(sql.contains(r#""publications"."deleted" = $1"#), "{sql}");
        assert!(sql.contains(r#""publications"."status" = $2"#), "{sql}");
        assert!(sql.contains(r#""publications"."category_id" = $3"#), "{sql}");
        assert!(sql.contains("LIMIT $4"), "{sql}");
        assert!(sql.contains("OFFSET $5"), "{sql}");
        assert_eq!(values.0.len(), 5);
        assert!(has_string(&values, "PUBLISHED"));
        assert!(!sql.contains("PUBLISHED"));
    }

    #[test]
    fn injection_attempt_stays_in_values() {
        let hostile = "x' OR '1'='1'; DROP TABLE publications; --";
        let (sql, values) = page_sql(ListParams::default().filter("status", hostile).search(hostile));

        assert!(!sql.contains("DROP TABLE"), "{sql}");
        assert!(!sql.contains("'1'='1'"), "{sql}");
        assert!(has_string(&values, hostile));
    }

    #[test]
    fn postgres_search_uses_ilike_or_group() {
        let (sql, values) = page_sql(ListParams::default().search("Été_100%"));

        assert!(sql.contains(r#""publications"."title" ILIKE $2"#), "{sql}");
        assert!(sql.contains(r#""publications"."abstract" ILIKE $3"#), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
        assert!(sql.contains("ESCAPE"), "{sql}");
        assert!(!sql.contains("LOWER("), "{sql}");
        assert!(has_string(&values, "%Été!_100!%%"));
    }

    #[test]
    fn sqlite_search_uses_escaped_regexp() {
        let (sql, values) = sqlite_page_sql(ListParams::default().search("Été.1+"));

        assert!(
            sql.contains(r#"COALESCE("publications"."title", '') REGEXP ?"#),
            "{sql}"
        );
        assert!(
            sql.contains(r#"COALESCE("publications"."abstract", '') REGEXP ?"#),
            "{sql}"
        );
        assert!(has_string(&values, r"(?i)Été\.1\+"));
    }

    #[test]
    fn date_bounds_compare_instants() {
        let params = ListParams::default().filter("from", "2024-05-05");

        let (sql, values) = page_sql(params.clone());
        assert!(sql.contains(r#""publications"."publication_date" >= $2"#), "{sql}");
        assert!(values.0.iter().any(|v| matches!(v, Value::ChronoDateTime(Some(_)))));

        let (sql, values) = sqlite_page_sql(params);
        assert!(
            sql.contains(r#"datetime("publications"."publication_date") >= ?"#),
            "{sql}"
        );
        assert!(has_string(&values, "2024-05-05 00:00:00"));
    }

    #[test]
    fn unknown_sort_uses_default_and_tie_breaker() {
        let (sql, _) = page_sql(ListParams::default().sort("dropTable", "desc"));
        assert!(
            sql.contains(r#"ORDER BY "publications"."created_at" DESC, "publications"."id" DESC"#),
            "{sql}"
        );
    }

    #[test]
    fn tie_breaker_not_repeated_when_sorting_by_it() {
        let resource = Resource::builder("partners", "partners")
            .sort("id", "id")
            .default_sort("id", SortDirection::Asc)
            .tie_breaker("id")
            .build()
            .unwrap();
        let request = resource.normalize(&ListParams::default(), 100).unwrap();
        let sql = ListQueryBuilder::new(&resource, &request, Dialect::Sqlite)
            .build_page()
            .to_string(SqliteQueryBuilder);

        assert!(sql.contains(r#"ORDER BY "partners"."id" ASC LIMIT"#), "{sql}");
    }

    #[test]
    fn count_query_shares_predicate_without_order_or_limit() {
        let resource = publications();
        let request = resource
            .normalize(
                &ListParams::default()
                    .filter("type", "Report")
                    .filter("from", "2024-01-01")
                    .search("youth"),
                100,
            )
            .unwrap();
        let builder = ListQueryBuilder::new(&resource, &request, Dialect::Sqlite);

        let (count_sql, count_values) = builder.build_count().build(SqliteQueryBuilder);
        let (page_sql, page_values) = builder.build_page().build(SqliteQueryBuilder);

        assert!(count_sql.starts_with("SELECT COUNT(*)"), "{count_sql}");
        assert!(!count_sql.contains("ORDER BY"));
        assert!(!count_sql.contains("LIMIT"));
        assert!(count_sql.contains(r#"LEFT JOIN "event_categories" AS "c""#), "{count_sql}");

        let where_count = &count_sql[count_sql.find("WHERE").unwrap()..];
        let where_page = &page_sql[page_sql.find("WHERE").unwrap()..page_sql.find("ORDER BY").unwrap()];
        assert_eq!(where_count, where_page.trim_end());

        // Page values are the count values plus limit and offset.
        assert_eq!(page_values.0.len(), count_values.0.len() + 2);
        assert_eq!(&page_values.0[..count_values.0.len()], &count_values.0[..]);
        assert!(has_string(&count_values, "(?i)Report"));
        assert!(has_string(&count_values, "2024-01-01 00:00:00"));
    }

    #[test]
    fn lookup_columns_are_aliased() {
        let (sql, _) = page_sql(ListParams::default());
        assert!(sql.contains(r#""c"."name" AS "category_name""#), "{sql}");
        assert!(
            sql.contains(r#"LEFT JOIN "event_categories" AS "c" ON "publications"."category_id" = "c"."id""#),
            "{sql}"
        );
    }

    #[test]
    fn no_where_without_predicates() {
        let resource = Resource::builder("partners", "partners")
            .sort("name", "name")
            .default_sort("name", SortDirection::Asc)
            .build()
            .unwrap();
        let request = resource.normalize(&ListParams::default(), 100).unwrap();
        let sql = ListQueryBuilder::new(&resource, &request, Dialect::Sqlite)
            .build_count()
            .to_string(SqliteQueryBuilder);
        assert_eq!(sql, r#"SELECT COUNT(*) FROM "partners""#);
    }

    #[test]
    fn escape_like_wildcards_function() {
        assert_eq!(escape_like_wildcards("hello"), "hello");
        assert_eq!(escape_like_wildcards("100%"), "100!%");
        assert_eq!(escape_like_wildcards("a_b"), "a!_b");
        assert_eq!(escape_like_wildcards("wow!"), "wow!!");
        assert_eq!(escape_like_wildcards("a\\b"), "a\\b");
    }
}
