//! List engine types.
//!
//! Provides the vocabulary shared by resource descriptors and the query builder:
//! - ColumnRef: qualified column references
//! - FilterField: a request parameter mapped onto a column comparison
//! - SortField / SortDirection: the ORDER BY allow-list
//! - Pagination / ListResult: the response envelope

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A column qualified by the table (or join alias) it belongs to.
///
/// `table: None` means the resource's base table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    /// Column on the base table.
    pub fn base(name: &str) -> Self {
        Self {
            table: None,
            name: name.to_string(),
        }
    }

    /// Column on a joined table, addressed by its alias.
    pub fn on(table: &str, name: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            name: name.to_string(),
        }
    }

    /// Resolve the owning table, falling back to the base table.
    pub fn table_or<'a>(&'a self, base: &'a str) -> &'a str {
        self.table.as_deref().unwrap_or(base)
    }
}

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Exact match.
    Equals,
    /// Case-insensitive substring match; text values only.
    Contains,
    /// Greater than or equal.
    AtLeast,
    /// Less than or equal.
    AtMost,
}

/// Expected type of a filter value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Integer,
    Boolean,
    /// `YYYY-MM-DD` or an ISO-8601 date-time.
    Date,
}

/// A typed literal, always bound as a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl Literal {
    /// Parse a raw request value according to the expected kind.
    ///
    /// Returns `None` when the value does not fit the kind.
    pub fn parse(kind: ValueKind, raw: &str) -> Option<Self> {
        match kind {
            ValueKind::Text => Some(Literal::Text(raw.to_string())),
            ValueKind::Integer => raw.trim().parse().ok().map(Literal::Integer),
            ValueKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(Literal::Boolean(true)),
                "false" | "0" | "no" => Some(Literal::Boolean(false)),
                _ => None,
            },
            ValueKind::Date => parse_timestamp(raw, false).map(Literal::Timestamp),
        }
    }

    /// Text form used in cache keys.
    pub fn as_key(&self) -> String {
        match self {
            Literal::Text(s) => format!("s:{s}"),
            Literal::Integer(i) => format!("i:{i}"),
            Literal::Boolean(b) => format!("b:{b}"),
            Literal::Timestamp(t) => format!("t:{}", t.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

/// Parse a date or date-time; a bare date means its first instant, or its
/// last one when `end_of_day` is set.
fn parse_timestamp(raw: &str, end_of_day: bool) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return if end_of_day {
            date.and_hms_milli_opt(23, 59, 59, 999)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.naive_utc());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

impl From<Literal> for sea_query::Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Text(s) => s.into(),
            Literal::Integer(i) => i.into(),
            Literal::Boolean(b) => b.into(),
            Literal::Timestamp(t) => t.into(),
        }
    }
}

/// A request parameter that can narrow the result set.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterField {
    /// Query parameter name (e.g. "category").
    pub param: String,

    /// Column the parameter is compared against.
    pub column: ColumnRef,

    /// Comparison operator.
    pub comparison: Comparison,

    /// Expected value type.
    pub kind: ValueKind,

    /// Value meaning "do not filter" (e.g. "all"), compared case-insensitively.
    pub wildcard: Option<String>,
}

impl FilterField {
    /// Exact text match on a base-table column.
    pub fn equals(param: &str, column: &str) -> Self {
        Self::new(param, ColumnRef::base(column), Comparison::Equals, ValueKind::Text)
    }

    /// Integer equality, typically a foreign key.
    pub fn integer(param: &str, column: &str) -> Self {
        Self::new(param, ColumnRef::base(column), Comparison::Equals, ValueKind::Integer)
    }

    /// Boolean equality.
    pub fn boolean(param: &str, column: &str) -> Self {
        Self::new(param, ColumnRef::base(column), Comparison::Equals, ValueKind::Boolean)
    }

    /// Case-insensitive substring match.
    pub fn contains(param: &str, column: &str) -> Self {
        Self::new(param, ColumnRef::base(column), Comparison::Contains, ValueKind::Text)
    }

    /// Rows dated on or after the given day or instant.
    pub fn on_or_after(param: &str, column: &str) -> Self {
        Self::new(param, ColumnRef::base(column), Comparison::AtLeast, ValueKind::Date)
    }

    /// Rows dated on or before the given instant; a bare date covers the
    /// whole day.
    pub fn on_or_before(param: &str, column: &str) -> Self {
        Self::new(param, ColumnRef::base(column), Comparison::AtMost, ValueKind::Date)
    }

    pub fn new(param: &str, column: ColumnRef, comparison: Comparison, kind: ValueKind) -> Self {
        Self {
            param: param.to_string(),
            column,
            comparison,
            kind,
            wildcard: None,
        }
    }

    /// Treat `value` as "no filter".
    pub fn with_wildcard(mut self, value: &str) -> Self {
        self.wildcard = Some(value.to_string());
        self
    }

    /// Parse a raw request value for this field.
    pub fn parse(&self, raw: &str) -> Option<Literal> {
        match (self.kind, self.comparison) {
            (ValueKind::Date, Comparison::AtMost) => {
                parse_timestamp(raw, true).map(Literal::Timestamp)
            }
            (kind, _) => Literal::parse(kind, raw),
        }
    }

    /// Whether a raw value should be skipped instead of applied.
    pub fn is_inert(&self, raw: &str) -> bool {
        let raw = raw.trim();
        raw.is_empty()
            || self
                .wildcard
                .as_deref()
                .is_some_and(|w| raw.eq_ignore_ascii_case(w))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse `asc`/`desc` case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl From<SortDirection> for sea_query::Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => sea_query::Order::Asc,
            SortDirection::Desc => sea_query::Order::Desc,
        }
    }
}

/// Entry in a resource's ORDER BY allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// Key accepted in the `sort` parameter (e.g. "startDate").
    pub key: String,

    /// Column the key orders by.
    pub column: ColumnRef,
}

impl SortField {
    /// Sort key mapped onto a base-table column.
    pub fn new(key: &str, column: &str) -> Self {
        Self {
            key: key.to_string(),
            column: ColumnRef::base(column),
        }
    }
}

/// To-one lookup joined into the page query (always LEFT JOIN).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Joined table.
    pub table: String,

    /// Alias used to address the joined table.
    pub alias: String,

    /// Base-table column holding the reference.
    pub local_column: String,

    /// Joined-table column referenced.
    pub foreign_column: String,

    /// Columns pulled from the joined table, as `(column, output alias)`.
    pub select: Vec<(String, String)>,
}

/// Fixed predicate applied on every query of a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: ColumnRef,
    pub value: Literal,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Rows matching the predicate, before paging.
    pub total: u64,

    /// Current page (1-indexed).
    pub page: u32,

    /// Rows per page.
    pub page_size: u32,

    /// `ceil(total / page_size)`; 0 when nothing matched.
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(total: u64, page: u32, page_size: u32) -> Self {
        Self {
            total,
            page,
            page_size,
            total_pages: super::pager::total_pages(total, page_size),
        }
    }

    /// Whether a later page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether an earlier page exists.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Result of a list call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResult {
    /// Page rows as JSON objects, enriched with relations.
    pub items: Vec<serde_json::Value>,

    pub pagination: Pagination,
}

impl ListResult {
    /// Create an empty result.
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::new(0, page, page_size),
        }
    }
}
