//! # sift-query
//!
//! Turns annotated request criteria into a predicate tree and restricts it
//! to the rows the acting user may see.
//!
//! The pipeline:
//! - [`reflect`] extracts the populated fields of a [`Criteria`] value
//! - [`PredicateCompiler`] turns each field into a [`Predicate`] according to
//!   its [`OperatorKind`]
//! - [`build`] AND-combines the field predicates
//! - [`ScopeResolver`] turns the user's role grants into a scope predicate
//! - [`assemble`] conjoins the two
//! - [`SqlRenderer`] renders the result as a parameterized `WHERE` clause
//!
//! ## Building a Filter
//!
//! ```rust
//! use sift_query::{CriteriaField, FieldSpec, OperatorKind, Predicate, build};
//!
//! let criteria = vec![
//!     CriteriaField::new(FieldSpec::new("createTime", OperatorKind::Between), vec!["2024-01-01", "2024-12-31"]),
//!     CriteriaField::new(FieldSpec::new("deptId", OperatorKind::In), vec![1, 2, 3]),
//!     CriteriaField::new(FieldSpec::new("nickname", OperatorKind::InnerLike), ""),
//! ];
//!
//! let filter = build(&criteria).unwrap();
//! // The empty nickname is skipped.
//! assert_eq!(filter.children().len(), 2);
//! assert_eq!(
//!     filter.to_string(),
//!     "(create_time BETWEEN '2024-01-01' AND '2024-12-31' AND dept_id IN (1, 2, 3))"
//! );
//! ```
//!
//! ## Blurry Search
//!
//! One search box matched against several columns:
//!
//! ```rust
//! use sift_query::{FieldSpec, FilterValue, OperatorKind, compile};
//!
//! let spec = FieldSpec::new("keyword", OperatorKind::Equal).blurry(["nickname", "email"]);
//! let predicate = compile(&spec, &FilterValue::from("ann")).unwrap();
//! assert_eq!(predicate.children().len(), 2);
//! ```
//!
//! ## Rendering SQL
//!
//! ```rust
//! use sift_query::{Comparison, Predicate, SqlRenderer};
//!
//! let filter = Predicate::and([
//!     Predicate::from(Comparison::equal("status", 1)),
//!     Predicate::from(Comparison::equal("create_user", "u1")),
//! ]);
//!
//! let rendered = SqlRenderer::postgres().render(&filter).unwrap();
//! assert_eq!(rendered.sql, "(status = $1 AND create_user = $2)");
//! assert_eq!(rendered.params.len(), 2);
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use sift_query::{CriteriaField, ErrorCode, FieldSpec, OperatorKind, build};
//!
//! let criteria = vec![CriteriaField::new(FieldSpec::new("age", OperatorKind::Between), vec![18])];
//! let err = build(&criteria).unwrap_err();
//! assert_eq!(err.code, ErrorCode::InvalidRange);
//! assert!(err.is_client_error());
//! ```

pub mod assembler;
pub mod compiler;
pub mod config;
pub mod criteria;
pub mod error;
pub mod filter;
pub mod logging;
pub mod naming;
pub mod operator;
pub mod pagination;
pub mod scope;
pub mod sql;
pub mod value;

pub use assembler::{QueryAssembler, assemble, build};
pub use compiler::{PredicateCompiler, compile};
pub use config::{
    ConfigError, ConfigResult, DataPermissionConfig, PaginationConfig, SiftConfig, SqlConfig,
};
pub use criteria::{Criteria, CriteriaField, CriteriaSchema, FieldSpec, JsonCriteria, reflect};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use filter::{Comparison, Operand, Predicate};
pub use logging::LogFormat;
pub use naming::underscore_case;
pub use operator::{Arity, LikePattern, OperatorKind, OperatorRegistry, OperatorRule};
pub use pagination::{OrderBy, OrderByField, PageQuery, Pagination, SortOrder};
pub use scope::{
    AuthContext, AuthContextProvider, DataScope, DataScopeService, OrgHierarchy, RoleContext,
    ScopeColumns, ScopeId, ScopeResolver, StaticAuthContextProvider, StaticOrgHierarchy,
};
pub use sql::{DatabaseType, RenderedSql, SqlRenderer, quote_identifier, validate_identifier};
pub use value::{FilterValue, ToFilterValue};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::assembler::{QueryAssembler, assemble, build};
    pub use crate::compiler::{PredicateCompiler, compile};
    pub use crate::criteria::{Criteria, CriteriaField, CriteriaSchema, FieldSpec};
    pub use crate::error::{ErrorCode, QueryError, QueryResult};
    pub use crate::filter::{Comparison, Operand, Predicate};
    pub use crate::operator::{OperatorKind, OperatorRegistry};
    pub use crate::pagination::{OrderBy, PageQuery, Pagination, SortOrder};
    pub use crate::scope::{AuthContext, AuthContextProvider, DataScope, DataScopeService, RoleContext, ScopeResolver};
    pub use crate::sql::{DatabaseType, SqlRenderer};
    pub use crate::value::{FilterValue, ToFilterValue};
}
