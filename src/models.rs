//! Query-time data models.
//!
//! The API owns no persistent state; everything here is constructed per
//! request and discarded. `QueryRequest` describes one filtered, paginated
//! query against a bound table and renders itself to SQL; `QueryOutcome` is
//! the shaped result the handlers turn into response envelopes.

use std::time::Duration;

use serde_json::Value as JsonValue;

/// Default page size when the client omits `limit`.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Maximum allowed page size.
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Sort direction for an order-by column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Ascending,
    Descending,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A single filtered/paginated/sorted query against one table.
///
/// Table and column names only ever come from the fixed constants in
/// `db::schema`, verified against the reflected schema at startup; filter
/// values are bound as `$1`, never spliced.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    table: String,
    filter: Option<(&'static str, String)>,
    page: Option<(i64, i64)>,
    order_by: Option<(&'static str, OrderDirection)>,
    top: Option<i64>,
}

impl QueryRequest {
    /// Create an unfiltered, unpaginated request against a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: None,
            page: None,
            order_by: None,
            top: None,
        }
    }

    /// Add an exact-equality filter on a column.
    pub fn with_filter(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.filter = Some((column, value.into()));
        self
    }

    /// Add limit/offset pagination. The limit is clamped to
    /// [1, `MAX_PAGE_LIMIT`] and a missing limit falls back to the default.
    pub fn with_page(mut self, limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        self.page = Some((limit, offset));
        self
    }

    /// Switch to a top-N scan: the N highest rows by `column` descending.
    /// Overrides limit/offset pagination entirely. N is clamped to
    /// [1, `MAX_PAGE_LIMIT`] like any other page size.
    pub fn with_top(mut self, n: i64, column: &'static str) -> Self {
        self.top = Some(n.clamp(1, MAX_PAGE_LIMIT));
        self.order_by = Some((column, OrderDirection::Descending));
        self
    }

    /// The value to bind as `$1`, if a filter is present.
    pub fn bind_value(&self) -> Option<&str> {
        self.filter.as_ref().map(|(_, value)| value.as_str())
    }

    /// Render the request to SQL.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM \"{}\"", self.table);
        if let Some((column, _)) = &self.filter {
            sql.push_str(&format!(" WHERE \"{column}\" = $1"));
        }
        if let Some(top) = self.top {
            // Top-N is a full ordered scan; limit/offset do not apply.
            if let Some((column, direction)) = &self.order_by {
                sql.push_str(&format!(" ORDER BY \"{column}\" {}", direction.as_sql()));
            }
            sql.push_str(&format!(" LIMIT {top}"));
        } else {
            if let Some((column, direction)) = &self.order_by {
                sql.push_str(&format!(" ORDER BY \"{column}\" {}", direction.as_sql()));
            }
            if let Some((limit, offset)) = self.page {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
        }
        sql
    }
}

/// The shaped result of one successful query execution.
#[derive(Debug)]
pub struct QueryOutcome {
    /// Rows as ordered column -> value maps.
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// Wall time spent across all attempts, backoff included.
    pub elapsed: Duration,
    /// Attempts consumed (1 when the first try succeeded).
    pub attempts: u32,
}

impl QueryOutcome {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Elapsed time formatted for the response envelope, e.g. "0.0042s".
    pub fn execution_time(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

/// Format a duration to 4 decimal places with a trailing unit suffix.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.4}s", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_select() {
        let request = QueryRequest::new("pool_matrix");
        assert_eq!(request.to_sql(), r#"SELECT * FROM "pool_matrix""#);
        assert!(request.bind_value().is_none());
    }

    #[test]
    fn test_pagination_clause() {
        let request = QueryRequest::new("recent_swaps").with_page(Some(25), Some(50));
        assert_eq!(
            request.to_sql(),
            r#"SELECT * FROM "recent_swaps" LIMIT 25 OFFSET 50"#
        );
    }

    #[test]
    fn test_pagination_defaults_and_clamping() {
        let request = QueryRequest::new("recent_swaps").with_page(None, None);
        assert!(request.to_sql().ends_with("LIMIT 10 OFFSET 0"));

        let request = QueryRequest::new("recent_swaps").with_page(Some(0), Some(-5));
        assert!(request.to_sql().ends_with("LIMIT 1 OFFSET 0"));

        let request = QueryRequest::new("recent_swaps").with_page(Some(99999), None);
        assert!(request.to_sql().ends_with(&format!("LIMIT {MAX_PAGE_LIMIT} OFFSET 0")));
    }

    #[test]
    fn test_exact_equality_filter_binds_value() {
        let request = QueryRequest::new("pool_matrix")
            .with_filter("contract_address", "zig1abc")
            .with_page(Some(10), Some(0));
        assert_eq!(
            request.to_sql(),
            r#"SELECT * FROM "pool_matrix" WHERE "contract_address" = $1 LIMIT 10 OFFSET 0"#
        );
        assert_eq!(request.bind_value(), Some("zig1abc"));
    }

    #[test]
    fn test_top_n_ignores_pagination() {
        let request = QueryRequest::new("pool_matrix")
            .with_page(Some(10), Some(40))
            .with_top(5, "total_liquidity");
        assert_eq!(
            request.to_sql(),
            r#"SELECT * FROM "pool_matrix" ORDER BY "total_liquidity" DESC LIMIT 5"#
        );
    }

    #[test]
    fn test_top_n_is_clamped() {
        let request = QueryRequest::new("pool_matrix").with_top(10_000_000, "total_liquidity");
        assert!(request.to_sql().ends_with(&format!("LIMIT {MAX_PAGE_LIMIT}")));

        let request = QueryRequest::new("pool_matrix").with_top(5, "total_liquidity");
        assert!(request.to_sql().ends_with("LIMIT 5"));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(4)), "0.0040s");
        assert_eq!(format_elapsed(Duration::from_secs_f64(1.23456)), "1.2346s");
        assert_eq!(format_elapsed(Duration::ZERO), "0.0000s");
    }
}
