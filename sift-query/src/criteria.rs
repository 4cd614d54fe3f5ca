//! Criteria values and their field descriptors.
//!
//! A criteria value is any request DTO whose fields carry comparison
//! metadata. Instead of inspecting values at runtime, every criteria type
//! declares its descriptor table up front through the [`Criteria`] trait:
//!
//! - `#[derive(Criteria)]` generates the table from `#[query(...)]` field
//!   attributes.
//! - [`CriteriaSchema`] registers descriptors at runtime and binds them to
//!   JSON request bodies through [`JsonCriteria`].
//!
//! [`reflect`] then keeps the fields that hold a usable value, in
//! declaration order.
//!
//! ```rust
//! use sift_query::{CriteriaSchema, FieldSpec, OperatorKind, reflect};
//! use serde_json::json;
//!
//! let schema = CriteriaSchema::new()
//!     .field(FieldSpec::new("nickname", OperatorKind::InnerLike))
//!     .field(FieldSpec::new("age", OperatorKind::Equal));
//!
//! let criteria = schema.bind(json!({ "age": 18 }));
//! let fields = reflect(&criteria).unwrap();
//! assert_eq!(fields.len(), 1);
//! assert_eq!(fields[0].spec.name, "age");
//! ```

use serde::Deserialize;

use crate::error::{QueryError, QueryResult};
use crate::naming::underscore_case;
use crate::operator::OperatorKind;
use crate::value::FilterValue;

/// One annotated field of a criteria value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as declared on the criteria type.
    pub name: String,
    /// Comparison operator.
    pub operator: OperatorKind,
    /// Column override. When unset the column is derived from the name.
    pub explicit_column: Option<String>,
    /// Columns matched by a multi-column fuzzy search. Duplicates are
    /// removed, first occurrence wins.
    pub blurry_targets: Vec<String>,
}

impl FieldSpec {
    /// Create a descriptor for a field compared with `operator`.
    pub fn new(name: impl Into<String>, operator: OperatorKind) -> Self {
        Self {
            name: name.into(),
            operator,
            explicit_column: None,
            blurry_targets: Vec::new(),
        }
    }

    /// Compare against `column` instead of the derived column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.explicit_column = Some(column.into());
        self
    }

    /// Match the value against each of `targets` with a substring search.
    pub fn blurry<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for target in targets {
            let target = target.into();
            if !self.blurry_targets.contains(&target) {
                self.blurry_targets.push(target);
            }
        }
        self
    }

    /// Whether this field compiles to a fuzzy OR-group.
    pub fn is_blurry(&self) -> bool {
        !self.blurry_targets.is_empty()
    }

    /// The column this field compares against.
    pub fn resolved_column(&self) -> String {
        match &self.explicit_column {
            Some(column) => column.clone(),
            None => underscore_case(&self.name),
        }
    }

    /// Whether the field is kept when its value is empty.
    ///
    /// Only the null tests are; a fuzzy group never is.
    pub fn accepts_empty(&self) -> bool {
        !self.is_blurry() && self.operator.rule().accepts_empty
    }
}

/// A field descriptor paired with the value it holds at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaField {
    /// The descriptor.
    pub spec: FieldSpec,
    /// The field's current value.
    pub value: FilterValue,
}

impl CriteriaField {
    /// Pair a descriptor with a value.
    pub fn new(spec: FieldSpec, value: impl Into<FilterValue>) -> Self {
        Self {
            spec,
            value: value.into(),
        }
    }

    /// Whether the reflector keeps this field.
    pub fn is_applicable(&self) -> bool {
        self.spec.accepts_empty() || !self.value.is_empty()
    }
}

/// A value whose fields carry comparison metadata.
///
/// Implementations return every annotated field in declaration order,
/// including the ones whose value is currently empty. Usually derived:
///
/// ```rust,ignore
/// #[derive(Criteria)]
/// struct UserQuery {
///     #[query(blurry("nickname", "email"))]
///     keyword: Option<String>,
///     #[query(between, column = "create_time")]
///     created: Vec<String>,
/// }
/// ```
pub trait Criteria {
    /// The annotated fields and their values.
    ///
    /// Fails with a reflection error when the value's shape does not match
    /// its descriptors.
    fn criteria_fields(&self) -> QueryResult<Vec<CriteriaField>>;
}

impl<C: Criteria + ?Sized> Criteria for &C {
    fn criteria_fields(&self) -> QueryResult<Vec<CriteriaField>> {
        (**self).criteria_fields()
    }
}

/// An absent criteria value has no fields.
impl<C: Criteria> Criteria for Option<C> {
    fn criteria_fields(&self) -> QueryResult<Vec<CriteriaField>> {
        match self {
            Some(criteria) => criteria.criteria_fields(),
            None => Ok(Vec::new()),
        }
    }
}

impl Criteria for [CriteriaField] {
    fn criteria_fields(&self) -> QueryResult<Vec<CriteriaField>> {
        Ok(self.to_vec())
    }
}

impl Criteria for Vec<CriteriaField> {
    fn criteria_fields(&self) -> QueryResult<Vec<CriteriaField>> {
        Ok(self.clone())
    }
}

/// Extract the fields of `criteria` that hold a usable value.
///
/// Empty fields are skipped unless their operator is a null test. Order is
/// the criteria type's declaration order.
pub fn reflect<C: Criteria + ?Sized>(criteria: &C) -> QueryResult<Vec<CriteriaField>> {
    let fields = criteria.criteria_fields()?;
    Ok(fields
        .into_iter()
        .filter(|field| {
            let keep = field.is_applicable();
            if !keep {
                crate::sift_trace!(field = %field.spec.name, "skipping empty criteria field");
            }
            keep
        })
        .collect())
}

// ============================================================================
// Runtime registration
// ============================================================================

/// An ordered list of field descriptors registered at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaSchema {
    fields: Vec<FieldSpec>,
}

/// Serialized form of one descriptor.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDescriptor {
    name: String,
    #[serde(default)]
    operator: Option<OperatorRef>,
    #[serde(default)]
    column: Option<String>,
    #[serde(default)]
    blurry: Vec<String>,
}

/// An operator given by numeric code or by name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OperatorRef {
    Code(u8),
    Name(String),
}

impl OperatorRef {
    fn resolve(self) -> QueryResult<OperatorKind> {
        match self {
            Self::Code(code) => OperatorKind::from_code(code),
            Self::Name(name) => name.parse(),
        }
    }
}

impl CriteriaSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field. Fields compile in registration order.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Parse a schema from a JSON array of descriptors.
    ///
    /// Each descriptor is `{"name", "operator"?, "column"?, "blurry"?}`, with
    /// the operator given by name (`"INNER_LIKE"`, case-insensitive) or by
    /// code (`9`). A missing operator means `EQUAL`.
    pub fn from_json(value: serde_json::Value) -> QueryResult<Self> {
        let descriptors: Vec<FieldDescriptor> = serde_json::from_value(value).map_err(|e| {
            QueryError::reflection(format!("invalid criteria schema: {}", e)).with_source(e)
        })?;

        let mut schema = Self::new();
        for descriptor in descriptors {
            let operator = match descriptor.operator {
                Some(op) => op.resolve()?,
                None => OperatorKind::Equal,
            };
            let mut spec = FieldSpec::new(descriptor.name, operator).blurry(descriptor.blurry);
            if let Some(column) = descriptor.column {
                spec = spec.column(column);
            }
            schema = schema.field(spec);
        }
        Ok(schema)
    }

    /// Registered descriptors in order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no field is registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Bind a JSON request body to this schema.
    pub fn bind(&self, value: serde_json::Value) -> JsonCriteria<'_> {
        JsonCriteria {
            schema: self,
            value,
        }
    }
}

/// A JSON object read through a [`CriteriaSchema`].
///
/// Keys not registered in the schema are ignored, like unannotated struct
/// fields. A registered key that is missing reads as null.
#[derive(Debug, Clone)]
pub struct JsonCriteria<'a> {
    schema: &'a CriteriaSchema,
    value: serde_json::Value,
}

impl JsonCriteria<'_> {
    /// The bound JSON value.
    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }
}

impl Criteria for JsonCriteria<'_> {
    fn criteria_fields(&self) -> QueryResult<Vec<CriteriaField>> {
        let object = match &self.value {
            serde_json::Value::Object(object) => object,
            serde_json::Value::Null => return Ok(Vec::new()),
            other => {
                return Err(QueryError::reflection(format!(
                    "expected a JSON object, found {}",
                    json_kind(other)
                )));
            }
        };

        self.schema
            .fields
            .iter()
            .map(|spec| {
                let raw = object.get(&spec.name).cloned().unwrap_or_default();
                if raw.is_object() {
                    return Err(QueryError::reflection(format!(
                        "field [{}] holds a nested object",
                        spec.name
                    ))
                    .with_field(&spec.name));
                }
                Ok(CriteriaField::new(spec.clone(), FilterValue::from(raw)))
            })
            .collect()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn user_schema() -> CriteriaSchema {
        CriteriaSchema::new()
            .field(FieldSpec::new("keyword", OperatorKind::InnerLike).blurry(["nickname", "email"]))
            .field(FieldSpec::new("age", OperatorKind::Equal))
            .field(FieldSpec::new("deletedAt", OperatorKind::IsNull))
            .field(FieldSpec::new("createTime", OperatorKind::Between).column("t.create_time"))
    }

    #[test]
    fn test_resolved_column() {
        assert_eq!(
            FieldSpec::new("createTime", OperatorKind::Equal).resolved_column(),
            "create_time"
        );
        assert_eq!(
            FieldSpec::new("createTime", OperatorKind::Equal)
                .column("created")
                .resolved_column(),
            "created"
        );
    }

    #[test]
    fn test_blurry_targets_are_deduplicated_in_order() {
        let spec = FieldSpec::new("q", OperatorKind::InnerLike).blurry(["b", "a", "b"]);
        assert_eq!(spec.blurry_targets, vec!["b".to_string(), "a".to_string()]);
        assert!(spec.is_blurry());
    }

    #[test]
    fn test_reflect_skips_empty_values() {
        let schema = user_schema();
        let criteria = schema.bind(json!({ "keyword": "", "age": 18 }));
        let fields = reflect(&criteria).unwrap();

        let names: Vec<_> = fields.iter().map(|f| f.spec.name.as_str()).collect();
        assert_eq!(names, vec!["age", "deletedAt"]);
    }

    #[test]
    fn test_reflect_keeps_declaration_order() {
        let schema = user_schema();
        let criteria = schema.bind(json!({
            "createTime": ["2024-01-01", "2024-02-01"],
            "age": 0,
            "keyword": "a",
        }));
        let fields = reflect(&criteria).unwrap();

        let names: Vec<_> = fields.iter().map(|f| f.spec.name.as_str()).collect();
        assert_eq!(names, vec!["keyword", "age", "deletedAt", "createTime"]);
    }

    #[test]
    fn test_absent_criteria_has_no_fields() {
        let none: Option<Vec<CriteriaField>> = None;
        assert!(reflect(&none).unwrap().is_empty());

        let schema = user_schema();
        let fields = reflect(&schema.bind(serde_json::Value::Null)).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_non_object_is_a_reflection_error() {
        let schema = user_schema();
        let err = reflect(&schema.bind(json!([1, 2]))).unwrap_err();
        assert_eq!(err.code, ErrorCode::Reflection);
        assert!(err.message.contains("an array"));
    }

    #[test]
    fn test_nested_object_is_a_reflection_error() {
        let schema = user_schema();
        let err = reflect(&schema.bind(json!({ "age": { "gt": 1 } }))).unwrap_err();
        assert_eq!(err.code, ErrorCode::Reflection);
        assert_eq!(err.context.field.as_deref(), Some("age"));
    }

    #[test]
    fn test_schema_from_json() {
        let schema = CriteriaSchema::from_json(json!([
            { "name": "keyword", "operator": "inner_like", "blurry": ["nickname", "email"] },
            { "name": "status", "operator": 11 },
            { "name": "age" },
            { "name": "createTime", "operator": "BETWEEN", "column": "created_at" },
        ]))
        .unwrap();

        assert_eq!(schema.len(), 4);
        assert_eq!(schema.fields()[0].operator, OperatorKind::InnerLike);
        assert_eq!(schema.fields()[1].operator, OperatorKind::In);
        assert_eq!(schema.fields()[2].operator, OperatorKind::Equal);
        assert_eq!(
            schema.fields()[3].explicit_column.as_deref(),
            Some("created_at")
        );
    }

    #[test]
    fn test_schema_rejects_unknown_operators() {
        let err = CriteriaSchema::from_json(json!([{ "name": "a", "operator": "SOUNDS_LIKE" }]))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperator);

        let err = CriteriaSchema::from_json(json!([{ "name": "a", "operator": 99 }])).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperator);
    }

    #[test]
    fn test_schema_rejects_malformed_descriptors() {
        let err = CriteriaSchema::from_json(json!({ "name": "a" })).unwrap_err();
        assert_eq!(err.code, ErrorCode::Reflection);

        let err = CriteriaSchema::from_json(json!([{ "name": "a", "colum": "x" }])).unwrap_err();
        assert_eq!(err.code, ErrorCode::Reflection);
    }
}
