//! Field name to column name conversion.

use convert_case::{Boundary, Case, Converter};

/// Word boundaries recognised in criteria field names.
///
/// A digit followed by a lowercase letter or another digit stays in the same
/// word, so `address2` keeps its shape.
const FIELD_BOUNDARIES: [Boundary; 6] = [
    Boundary::Underscore,
    Boundary::Hyphen,
    Boundary::Space,
    Boundary::LowerUpper,
    Boundary::DigitUpper,
    Boundary::Acronym,
];

/// Convert a camelCase field name to its snake_case column name.
///
/// ```rust
/// use sift_query::underscore_case;
///
/// assert_eq!(underscore_case("createTime"), "create_time");
/// assert_eq!(underscore_case("dept_id"), "dept_id");
/// ```
pub fn underscore_case(name: &str) -> String {
    Converter::new()
        .set_boundaries(&FIELD_BOUNDARIES)
        .to_case(Case::Snake)
        .convert(name)
}
