//! # Sift
//!
//! Declarative list-query filters with row-level data scoping.
//!
//! Sift provides:
//! - Criteria structs whose fields declare how they filter (`#[query(...)]`)
//! - A compiler from criteria values to a composable predicate tree
//! - Data scopes (own rows, department, department subtree, custom set, all)
//!   resolved from the caller's roles and AND-ed onto every list query
//! - Parameterized SQL rendering for PostgreSQL, MySQL, SQLite and SQL Server
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sift::prelude::*;
//!
//! #[derive(Criteria)]
//! #[criteria(crate = "sift::query")]
//! pub struct UserQuery {
//!     #[query(blurry("nickname", "email"))]
//!     pub keyword: Option<String>,
//!     #[query(between, column = "create_time")]
//!     pub created: Vec<String>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QueryError> {
//!     let config = sift::query::SiftConfig::from_file("sift.toml")?;
//!     let service = DataScopeService::new(provider, config.scope_resolver());
//!
//!     let filter = service.scoped_filter(&request).await?;
//!     let sql = config.renderer().render(&filter)?;
//!     println!("SELECT * FROM sys_user WHERE {}", sql.sql);
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Criteria compilation, data scoping and SQL rendering.
pub mod query {
    pub use sift_query::*;
}

// Re-export proc macros
pub use sift_codegen::Criteria;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::Criteria;
    pub use sift_query::prelude::*;
}

// Re-export key types at the crate root
pub use sift_query::{Predicate, QueryError, QueryResult, SiftConfig};
