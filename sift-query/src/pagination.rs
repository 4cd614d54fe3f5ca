//! Paging and sorting for list queries.
//!
//! A [`PageQuery`] is the paging half of a list request (`page`, `size`,
//! `sort`). It resolves against a [`PaginationConfig`] into a [`Pagination`]
//! (limit and offset) and an [`OrderBy`]:
//!
//! ```rust
//! use sift_query::{DatabaseType, PageQuery, PaginationConfig, SortOrder};
//!
//! let query = PageQuery::new(3, 25).sort_by("createTime,desc");
//! let config = PaginationConfig::default();
//!
//! let pagination = query.paginate(&config).unwrap();
//! assert_eq!(pagination.offset(), 50);
//! assert_eq!(pagination.to_sql(DatabaseType::PostgreSQL), "LIMIT 25 OFFSET 50");
//!
//! let order = query.order_by().unwrap();
//! assert_eq!(order.fields()[0].column, "create_time");
//! assert_eq!(order.fields()[0].order, SortOrder::Desc);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::error::{QueryError, QueryResult};
use crate::naming::underscore_case;
use crate::sql::{DatabaseType, quote_identifier, validate_identifier};

/// Paging parameters of a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    /// 1-based page number. Defaults to 1.
    pub page: Option<u64>,
    /// Page size. Defaults to the configured size.
    pub size: Option<u64>,
    /// Sort entries such as `"createTime,desc"`.
    pub sort: Vec<String>,
}

impl PageQuery {
    /// Request `page` with `size` rows per page.
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
            sort: Vec::new(),
        }
    }

    /// Add a sort entry.
    pub fn sort_by(mut self, entry: impl Into<String>) -> Self {
        self.sort.push(entry.into());
        self
    }

    /// Resolve page and size against `config`.
    ///
    /// The size is clamped to the configured maximum. Page or size zero is a
    /// client error.
    pub fn paginate(&self, config: &PaginationConfig) -> QueryResult<Pagination> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(QueryError::invalid_parameter("page", "pages start at 1"));
        }

        let mut size = self.size.unwrap_or(config.default_size);
        if size == 0 {
            return Err(QueryError::invalid_parameter("size", "must be at least 1"));
        }
        if let Some(max) = config.max_limit {
            size = size.min(max);
        }

        Ok(Pagination {
            page,
            size,
            overflow: config.overflow,
        })
    }

    /// Parse the sort entries.
    pub fn order_by(&self) -> QueryResult<OrderBy> {
        self.sort
            .iter()
            .map(|entry| OrderByField::parse(entry))
            .collect::<QueryResult<Vec<_>>>()
            .map(OrderBy::from_fields)
    }
}

/// A resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    size: u64,
    overflow: bool,
}

impl Pagination {
    /// A window without overflow handling.
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
            overflow: false,
        }
    }

    /// 1-based page number.
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Rows per page, the SQL `LIMIT`.
    pub fn limit(&self) -> u64 {
        self.size
    }

    /// Rows skipped, the SQL `OFFSET`.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    /// Number of pages needed for `total` rows.
    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(self.size)
    }

    /// Adjust the window once the total row count is known.
    ///
    /// With overflow handling on, a page past the last one wraps back to
    /// page 1. Otherwise the window is returned unchanged.
    pub fn for_total(self, total: u64) -> Self {
        if self.overflow && total > 0 && self.offset() >= total {
            Self { page: 1, ..self }
        } else {
            self
        }
    }

    /// Render the `LIMIT`/`OFFSET` clause.
    pub fn to_sql(&self, db_type: DatabaseType) -> String {
        match db_type {
            DatabaseType::MSSQL => format!(
                "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                self.offset(),
                self.limit()
            ),
            _ if self.offset() == 0 => format!("LIMIT {}", self.limit()),
            _ => format!("LIMIT {} OFFSET {}", self.limit(), self.offset()),
        }
    }
}

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0, newest first).
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByField {
    /// The column name to order by.
    pub column: String,
    /// The sort order.
    pub order: SortOrder,
}

impl OrderByField {
    /// Create a new order by field.
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }

    /// Parse `"field"` or `"field,asc|desc"`; the field name goes through
    /// the same case conversion as criteria fields.
    pub fn parse(entry: &str) -> QueryResult<Self> {
        let (field, direction) = match entry.split_once(',') {
            Some((field, direction)) => (field.trim(), Some(direction.trim())),
            None => (entry.trim(), None),
        };

        let order = match direction.map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(other) => {
                return Err(QueryError::invalid_parameter(
                    "sort",
                    format!("direction [{}] must be asc or desc", other),
                ));
            }
        };

        let column = underscore_case(field);
        validate_identifier(&column).map_err(|_| {
            QueryError::invalid_parameter("sort", format!("[{}] is not a sortable field", field))
        })?;
        Ok(Self::new(column, order))
    }
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy {
    fields: Vec<OrderByField>,
}

impl OrderBy {
    /// Create an OrderBy from multiple fields.
    pub fn from_fields(fields: impl IntoIterator<Item = OrderByField>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Add a field to the order by.
    pub fn then(mut self, field: OrderByField) -> Self {
        self.fields.push(field);
        self
    }

    /// The sort keys in order.
    pub fn fields(&self) -> &[OrderByField] {
        &self.fields
    }

    /// Check if the order by is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render `ORDER BY ...`, or an empty string when there are no keys.
    pub fn to_sql(&self, db_type: DatabaseType) -> QueryResult<String> {
        if self.fields.is_empty() {
            return Ok(String::new());
        }
        let keys = self
            .fields
            .iter()
            .map(|f| Ok(format!("{} {}", quote_identifier(&f.column, db_type)?, f.order)))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(format!("ORDER BY {}", keys.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn config(max_limit: Option<u64>, overflow: bool) -> PaginationConfig {
        PaginationConfig {
            default_size: 10,
            max_limit,
            overflow,
        }
    }

    #[test]
    fn test_defaults() {
        let p = PageQuery::default().paginate(&config(None, false)).unwrap();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.to_sql(DatabaseType::MySQL), "LIMIT 10");
    }

    #[test]
    fn test_max_limit_clamps_size() {
        let p = PageQuery::new(2, 1000).paginate(&config(Some(100), false)).unwrap();
        assert_eq!(p.limit(), 100);
        assert_eq!(p.offset(), 100);
    }

    #[test]
    fn test_zero_page_or_size_is_rejected() {
        let err = PageQuery::new(0, 10).paginate(&config(None, false)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);
        assert!(err.is_client_error());

        let err = PageQuery::new(1, 0).paginate(&config(None, false)).unwrap_err();
        assert_eq!(err.context.field.as_deref(), Some("size"));
    }

    #[test]
    fn test_overflow_wraps_to_first_page() {
        let p = PageQuery::new(5, 10).paginate(&config(None, true)).unwrap();
        assert_eq!(p.for_total(25).page(), 1);
        assert_eq!(p.for_total(100).page(), 5);
        assert_eq!(p.for_total(0).page(), 5);

        let p = PageQuery::new(5, 10).paginate(&config(None, false)).unwrap();
        assert_eq!(p.for_total(25).page(), 5);
    }

    #[test]
    fn test_pages() {
        let p = Pagination::new(1, 10);
        assert_eq!(p.pages(0), 0);
        assert_eq!(p.pages(10), 1);
        assert_eq!(p.pages(11), 2);
    }

    #[test]
    fn test_mssql_paging() {
        let p = Pagination::new(3, 20);
        assert_eq!(
            p.to_sql(DatabaseType::MSSQL),
            "OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY"
        );
    }

    #[test]
    fn test_sort_parsing() {
        let order = PageQuery::default()
            .sort_by("createTime,desc")
            .sort_by("id")
            .sort_by("user , ASC")
            .order_by()
            .unwrap();

        assert_eq!(
            order.fields(),
            &[
                OrderByField::new("create_time", SortOrder::Desc),
                OrderByField::new("id", SortOrder::Asc),
                OrderByField::new("user", SortOrder::Asc),
            ]
        );
        assert_eq!(
            order.to_sql(DatabaseType::PostgreSQL).unwrap(),
            "ORDER BY create_time DESC, id ASC, \"user\" ASC"
        );
    }

    #[test]
    fn test_bad_sort_is_a_client_error() {
        let err = PageQuery::default().sort_by("id,sideways").order_by().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);

        let err = PageQuery::default().sort_by("id;drop table").order_by().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);
    }

    #[test]
    fn test_page_query_from_json() {
        let q: PageQuery =
            serde_json::from_str(r#"{"page": 2, "sort": ["createTime,desc"]}"#).unwrap();
        assert_eq!(q.page, Some(2));
        assert_eq!(q.size, None);
        assert_eq!(q.sort.len(), 1);
    }
}
