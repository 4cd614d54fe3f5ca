//! Reference SQL rendering for predicate trees.
//!
//! The compiler guarantees a well-formed tree; this module turns it into a
//! parameterised `WHERE` fragment. Every operand becomes a bound parameter,
//! every AND/OR group is parenthesised, and identifiers are checked against
//! a conservative character set before they reach the SQL text.
//!
//! ```rust
//! use sift_query::{Comparison, DatabaseType, OperatorKind, Predicate, SqlRenderer};
//!
//! let filter = Predicate::and([
//!     Predicate::or([
//!         Predicate::from(Comparison::single("nickname", OperatorKind::InnerLike, "a")),
//!         Predicate::from(Comparison::single("email", OperatorKind::InnerLike, "a")),
//!     ]),
//!     Predicate::from(Comparison::equal("age", 18)),
//! ]);
//!
//! let rendered = SqlRenderer::new(DatabaseType::PostgreSQL).render(&filter).unwrap();
//! assert_eq!(
//!     rendered.sql,
//!     "((nickname LIKE $1 ESCAPE '\\' OR email LIKE $2 ESCAPE '\\') AND age = $3)"
//! );
//! assert_eq!(rendered.params.len(), 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::filter::{Comparison, Operand, Predicate};
use crate::operator::OperatorKind;
use crate::value::FilterValue;

/// Reserved words that must be quoted when used as a column name.
const RESERVED: &[&str] = &[
    "user", "order", "group", "select", "from", "where", "table", "index", "key", "primary",
    "foreign", "check", "default", "null", "not", "and", "or", "in", "is", "like", "between",
    "case", "when", "then", "else", "end", "as", "on", "join", "left", "right", "inner", "outer",
    "cross", "natural", "using", "limit", "offset", "union", "intersect", "except", "all",
    "distinct", "having", "create", "alter", "drop", "insert", "update", "delete", "into",
    "values", "set", "returning", "desc", "asc", "by",
];

/// The SQL dialect to render for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// PostgreSQL uses $1, $2, etc.
    #[default]
    #[serde(alias = "postgres")]
    PostgreSQL,
    /// MySQL uses ?, ?, etc.
    MySQL,
    /// SQLite uses ?, ?, etc.
    SQLite,
    /// SQL Server uses @P1, @P2, etc.
    #[serde(alias = "sqlserver")]
    MSSQL,
}

impl DatabaseType {
    /// Get the parameter placeholder for this database type.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MySQL | Self::SQLite => "?".to_string(),
            Self::MSSQL => format!("@P{}", index),
        }
    }

    /// Wrap one identifier segment in this dialect's quotes.
    pub fn quote(&self, segment: &str) -> String {
        match self {
            Self::PostgreSQL | Self::SQLite => format!("\"{}\"", segment),
            Self::MySQL => format!("`{}`", segment),
            Self::MSSQL => format!("[{}]", segment),
        }
    }

    /// The `ESCAPE` clause used after LIKE comparisons.
    fn like_escape(&self) -> &'static str {
        match self {
            // backslash is a string escape in MySQL literals
            Self::MySQL => " ESCAPE '\\\\'",
            _ => " ESCAPE '\\'",
        }
    }

    /// Escape LIKE metacharacters in a literal search value.
    pub fn escape_like(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            let special = matches!(c, '\\' | '%' | '_') || (c == '[' && *self == Self::MSSQL);
            if special {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }
}

/// Reject identifiers outside `[A-Za-z0-9_]` segments joined by dots.
pub fn validate_identifier(name: &str) -> QueryResult<()> {
    let valid = !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(QueryError::invalid_configuration(format!(
            "[{}] is not a safe SQL identifier",
            name
        ))
        .with_help("Column names may only contain letters, digits, underscores and a table alias"))
    }
}

/// Check if an identifier segment needs quoting.
pub fn needs_quoting(segment: &str) -> bool {
    RESERVED.contains(&segment.to_ascii_lowercase().as_str())
        || segment.starts_with(|c: char| c.is_ascii_digit())
}

/// Validate an identifier and quote the segments that need it.
pub fn quote_identifier(name: &str, db_type: DatabaseType) -> QueryResult<String> {
    validate_identifier(name)?;
    Ok(name
        .split('.')
        .map(|segment| {
            if needs_quoting(segment) {
                db_type.quote(segment)
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("."))
}

/// A rendered fragment and its parameters in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    /// The SQL text.
    pub sql: String,
    /// Values for the placeholders.
    pub params: Vec<FilterValue>,
}

impl RenderedSql {
    /// The fragment prefixed with `WHERE`, or empty when it matches every row.
    pub fn where_clause(&self) -> String {
        if self.sql == "1=1" {
            String::new()
        } else {
            format!(" WHERE {}", self.sql)
        }
    }
}

/// Renders predicates for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct SqlRenderer {
    db_type: DatabaseType,
    first_index: usize,
}

impl Default for SqlRenderer {
    fn default() -> Self {
        Self::new(DatabaseType::default())
    }
}

impl SqlRenderer {
    /// Create a renderer; placeholders start at 1.
    pub fn new(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            first_index: 1,
        }
    }

    /// Create a PostgreSQL renderer.
    pub fn postgres() -> Self {
        Self::new(DatabaseType::PostgreSQL)
    }

    /// Create a MySQL renderer.
    pub fn mysql() -> Self {
        Self::new(DatabaseType::MySQL)
    }

    /// Create a SQLite renderer.
    pub fn sqlite() -> Self {
        Self::new(DatabaseType::SQLite)
    }

    /// Create a SQL Server renderer.
    pub fn mssql() -> Self {
        Self::new(DatabaseType::MSSQL)
    }

    /// Number placeholders from `index`, for appending to a statement that
    /// already binds `index - 1` parameters.
    pub fn starting_at(mut self, index: usize) -> Self {
        self.first_index = index.max(1);
        self
    }

    /// The dialect in use.
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    /// Render a predicate.
    pub fn render(&self, predicate: &Predicate) -> QueryResult<RenderedSql> {
        let mut builder = SqlBuilder::new(self.db_type, self.first_index);
        builder.push_predicate(predicate)?;
        Ok(builder.build())
    }
}

/// Accumulates SQL text and parameters.
#[derive(Debug)]
struct SqlBuilder {
    db_type: DatabaseType,
    first_index: usize,
    sql: String,
    params: Vec<FilterValue>,
}

impl SqlBuilder {
    fn new(db_type: DatabaseType, first_index: usize) -> Self {
        Self {
            db_type,
            first_index,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    fn push_param(&mut self, value: FilterValue) -> &mut Self {
        let index = self.first_index + self.params.len();
        self.sql.push_str(&self.db_type.placeholder(index));
        self.params.push(value);
        self
    }

    fn push_identifier(&mut self, name: &str) -> QueryResult<&mut Self> {
        let quoted = quote_identifier(name, self.db_type)?;
        self.sql.push_str(&quoted);
        Ok(self)
    }

    fn push_predicate(&mut self, predicate: &Predicate) -> QueryResult<()> {
        match predicate {
            Predicate::Comparison(c) => self.push_comparison(c)?,
            Predicate::And(children) if children.is_empty() => {
                self.push("1=1");
            }
            Predicate::Or(children) if children.is_empty() => {
                self.push("1=0");
            }
            Predicate::And(children) => self.push_group(children, " AND ")?,
            Predicate::Or(children) => self.push_group(children, " OR ")?,
            Predicate::Not(inner) => {
                self.push("NOT (");
                self.push_predicate(inner)?;
                self.push(")");
            }
        }
        Ok(())
    }

    fn push_group(&mut self, children: &[Predicate], sep: &str) -> QueryResult<()> {
        self.push("(");
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.push(sep);
            }
            self.push_predicate(child)?;
        }
        self.push(")");
        Ok(())
    }

    fn push_comparison(&mut self, c: &Comparison) -> QueryResult<()> {
        self.push_identifier(&c.column)?;

        match (c.operator, &c.operand) {
            (OperatorKind::IsNull, Operand::None) => {
                self.push(" IS NULL");
            }
            (OperatorKind::IsNotNull, Operand::None) => {
                self.push(" IS NOT NULL");
            }
            (OperatorKind::Between, Operand::Range(lo, hi)) => {
                self.push(" BETWEEN ")
                    .push_param(lo.clone())
                    .push(" AND ")
                    .push_param(hi.clone());
            }
            (OperatorKind::In | OperatorKind::NotIn, Operand::List(items)) if !items.is_empty() => {
                let keyword = if c.operator == OperatorKind::In { " IN (" } else { " NOT IN (" };
                self.push(keyword);
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push_param(item.clone());
                }
                self.push(")");
            }
            (op, Operand::Single(value)) => match op.rule().like {
                Some(pattern) => {
                    let text = like_text(&c.column, value)?;
                    let escape = self.db_type.like_escape();
                    let bound = pattern.wrap(&self.db_type.escape_like(&text));
                    self.push(" LIKE ").push_param(FilterValue::String(bound)).push(escape);
                }
                None => {
                    let symbol = comparison_symbol(op).ok_or_else(|| malformed(c))?;
                    self.push(" ").push(symbol).push(" ").push_param(value.clone());
                }
            },
            _ => return Err(malformed(c)),
        }
        Ok(())
    }

    fn build(self) -> RenderedSql {
        RenderedSql {
            sql: self.sql,
            params: self.params,
        }
    }
}

fn comparison_symbol(op: OperatorKind) -> Option<&'static str> {
    match op {
        OperatorKind::Equal => Some("="),
        OperatorKind::NotEqual => Some("<>"),
        OperatorKind::GreaterThan => Some(">"),
        OperatorKind::LessThan => Some("<"),
        OperatorKind::GreaterOrEqual => Some(">="),
        OperatorKind::LessOrEqual => Some("<="),
        _ => None,
    }
}

fn like_text(column: &str, value: &FilterValue) -> QueryResult<String> {
    match value {
        FilterValue::String(s) => Ok(s.clone()),
        FilterValue::Int(i) => Ok(i.to_string()),
        FilterValue::Float(f) => Ok(f.to_string()),
        FilterValue::Bool(b) => Ok(b.to_string()),
        _ => Err(QueryError::invalid_parameter(
            column,
            "LIKE needs a text value",
        )),
    }
}

fn malformed(c: &Comparison) -> QueryError {
    QueryError::internal(format!(
        "operand does not match operator {} on [{}]",
        c.operator, c.column
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    fn render(db: DatabaseType, predicate: &Predicate) -> RenderedSql {
        SqlRenderer::new(db).render(predicate).unwrap()
    }

    #[test]
    fn test_needs_quoting() {
        assert!(needs_quoting("user"));
        assert!(needs_quoting("order"));
        assert!(needs_quoting("1st"));
        assert!(!needs_quoting("my_table"));
        assert!(!needs_quoting("users"));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("user", DatabaseType::PostgreSQL).unwrap(), "\"user\"");
        assert_eq!(quote_identifier("t.order", DatabaseType::MySQL).unwrap(), "t.`order`");
        assert_eq!(quote_identifier("t.user", DatabaseType::MSSQL).unwrap(), "t.[user]");
        assert_eq!(quote_identifier("dept_id", DatabaseType::SQLite).unwrap(), "dept_id");
    }

    #[test]
    fn test_unsafe_identifiers_are_rejected() {
        for name in ["", "a b", "a;drop", "t.", ".a", "name\"", "a--"] {
            let err = quote_identifier(name, DatabaseType::PostgreSQL).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidConfiguration, "{name}");
        }
    }

    #[test]
    fn test_database_placeholder() {
        assert_eq!(DatabaseType::PostgreSQL.placeholder(1), "$1");
        assert_eq!(DatabaseType::PostgreSQL.placeholder(5), "$5");
        assert_eq!(DatabaseType::MySQL.placeholder(1), "?");
        assert_eq!(DatabaseType::SQLite.placeholder(1), "?");
        assert_eq!(DatabaseType::MSSQL.placeholder(2), "@P2");
    }

    #[test]
    fn test_identity_elements() {
        assert_eq!(render(DatabaseType::PostgreSQL, &Predicate::always_true()).sql, "1=1");
        assert_eq!(render(DatabaseType::PostgreSQL, &Predicate::always_false()).sql, "1=0");
        assert_eq!(
            render(DatabaseType::PostgreSQL, &Predicate::always_true()).where_clause(),
            ""
        );
    }

    #[test]
    fn test_scalar_comparisons() {
        let p = Predicate::and([
            Predicate::from(Comparison::single("age", OperatorKind::GreaterOrEqual, 18)),
            Predicate::from(Comparison::single("status", OperatorKind::NotEqual, "deleted")),
        ]);
        let out = render(DatabaseType::PostgreSQL, &p);
        assert_eq!(out.sql, "(age >= $1 AND status <> $2)");
        assert_eq!(out.params, vec![FilterValue::Int(18), FilterValue::from("deleted")]);
        assert_eq!(out.where_clause(), " WHERE (age >= $1 AND status <> $2)");
    }

    #[test]
    fn test_between_in_and_null_tests() {
        let p = Predicate::and([
            Predicate::from(Comparison::new(
                "create_time",
                OperatorKind::Between,
                Operand::Range("2024-01-01".into(), "2024-02-01".into()),
            )),
            Predicate::from(Comparison::in_list("dept_id", [1, 2, 3])),
            Predicate::from(Comparison::new("deleted_at", OperatorKind::IsNull, Operand::None)),
        ]);
        let out = render(DatabaseType::MySQL, &p);
        assert_eq!(
            out.sql,
            "(create_time BETWEEN ? AND ? AND dept_id IN (?, ?, ?) AND deleted_at IS NULL)"
        );
        assert_eq!(out.params.len(), 5);
    }

    #[test]
    fn test_like_wildcards_and_escaping() {
        let left = Comparison::single("name", OperatorKind::LeftLike, "50%_off");
        let out = render(DatabaseType::PostgreSQL, &left.into());
        assert_eq!(out.sql, "name LIKE $1 ESCAPE '\\'");
        assert_eq!(out.params, vec![FilterValue::from("50\\%\\_off%")]);

        let right = Comparison::single("name", OperatorKind::RightLike, "son");
        let out = render(DatabaseType::MySQL, &right.into());
        assert_eq!(out.sql, "name LIKE ? ESCAPE '\\\\'");
        assert_eq!(out.params, vec![FilterValue::from("%son")]);

        let inner = Comparison::single("name", OperatorKind::InnerLike, "[a]");
        let out = render(DatabaseType::MSSQL, &inner.into());
        assert_eq!(out.params, vec![FilterValue::from("%\\[a]%")]);
    }

    #[test]
    fn test_starting_index() {
        let p = Predicate::from(Comparison::equal("age", 1));
        let out = SqlRenderer::postgres().starting_at(3).render(&p).unwrap();
        assert_eq!(out.sql, "age = $3");
    }

    #[test]
    fn test_not_and_single_child_groups() {
        let p = Predicate::not(Predicate::or([Predicate::from(Comparison::equal("a", 1))]));
        let out = render(DatabaseType::SQLite, &p);
        assert_eq!(out.sql, "NOT ((a = ?))");
    }

    #[test]
    fn test_malformed_operands_are_internal_errors() {
        let p = Predicate::from(Comparison::new(
            "age",
            OperatorKind::Between,
            Operand::Single(FilterValue::Int(1)),
        ));
        let err = SqlRenderer::postgres().render(&p).unwrap_err();
        assert_eq!(err.code, ErrorCode::Internal);

        let p = Predicate::from(Comparison::new("ids", OperatorKind::In, Operand::List(vec![])));
        assert!(SqlRenderer::postgres().render(&p).is_err());
    }

    #[test]
    fn test_dialect_names() {
        let db: DatabaseType = serde_json::from_str("\"postgresql\"").unwrap();
        assert_eq!(db, DatabaseType::PostgreSQL);
        let db: DatabaseType = serde_json::from_str("\"mssql\"").unwrap();
        assert_eq!(db, DatabaseType::MSSQL);
    }
}
