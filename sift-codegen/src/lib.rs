//! Procedural macros for sift.
//!
//! # Macros
//!
//! - [`Criteria`] - Derive the field descriptor table of a criteria struct
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(sift::Criteria)]
//! #[criteria(crate = "sift::query")]
//! struct UserQuery {
//!     #[query(inner_like)]
//!     nickname: Option<String>,
//!     #[query(between, column = "create_time")]
//!     created: Vec<String>,
//!     // Not a filter.
//!     page: u64,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod generators;

/// Derive macro implementing `sift_query::Criteria`.
///
/// Each field marked `#[query]` becomes one `CriteriaField`, in declaration
/// order. Unmarked fields are ignored. Field types must implement
/// `ToFilterValue`.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[criteria(crate = "path")]` - Path to the runtime crate (default
///   `::sift_query`; use `"sift::query"` through the facade crate)
///
/// ## Field-level
/// - `#[query]` - Compare for equality
/// - `#[query(op)]` - Compare with `op`, one of `equal`, `not_equal`,
///   `greater_than`, `less_than`, `greater_or_equal`, `less_or_equal`,
///   `between`, `left_like`, `inner_like`, `right_like`, `in`, `not_in`,
///   `is_null`, `is_not_null`
/// - `#[query(op, column = "col")]` - Compare against a different column
/// - `#[query(blurry("a", "b"))]` - Substring-match the value against each
///   listed column, OR-combined
///
/// # Example
///
/// ```rust,ignore
/// #[derive(sift::Criteria)]
/// #[criteria(crate = "sift::query")]
/// struct DeptQuery {
///     #[query(in, column = "dept_id")]
///     depts: Vec<i64>,
///     #[query(blurry("name", "code"))]
///     keyword: Option<String>,
///     #[query(is_null)]
///     deleted_at: Option<String>,
/// }
/// ```
#[proc_macro_derive(Criteria, attributes(query, criteria))]
pub fn derive_criteria(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generators::derive_criteria_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
