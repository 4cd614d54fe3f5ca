//! Compiles criteria fields into predicates.
//!
//! One `(FieldSpec, value)` pair becomes either a single [`Comparison`] or,
//! for a fuzzy multi-column field, a raw `Or` of `INNER_LIKE` comparisons.
//! Operand shape is validated against the operator's [`Arity`] before any
//! node is built, so a failing field never yields a partial tree.
//!
//! ```rust
//! use sift_query::{compile, FieldSpec, FilterValue, OperatorKind, Predicate};
//!
//! let spec = FieldSpec::new("keyword", OperatorKind::InnerLike).blurry(["nickname", "email"]);
//! let predicate = compile(&spec, &FilterValue::from("a")).unwrap();
//! assert!(matches!(predicate, Predicate::Or(ref targets) if targets.len() == 2));
//! ```

use tracing::{debug, warn};

use crate::criteria::{Criteria, CriteriaField, FieldSpec, reflect};
use crate::error::{QueryError, QueryResult};
use crate::filter::{Comparison, Operand, Predicate};
use crate::naming::underscore_case;
use crate::operator::{Arity, OperatorKind, OperatorRegistry};
use crate::value::FilterValue;

/// Compiles fields against an operator registry.
#[derive(Debug, Clone, Copy)]
pub struct PredicateCompiler<'r> {
    registry: &'r OperatorRegistry,
}

impl Default for PredicateCompiler<'static> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'r> PredicateCompiler<'r> {
    /// Create a compiler that only accepts operators in `registry`.
    pub fn new(registry: &'r OperatorRegistry) -> Self {
        Self { registry }
    }

    /// A compiler accepting every operator.
    pub fn standard() -> PredicateCompiler<'static> {
        PredicateCompiler::new(OperatorRegistry::standard())
    }

    /// The registry in use.
    pub fn registry(&self) -> &'r OperatorRegistry {
        self.registry
    }

    /// Compile one field and its value.
    pub fn compile(&self, spec: &FieldSpec, value: &FilterValue) -> QueryResult<Predicate> {
        let result = if spec.is_blurry() {
            self.compile_blurry(spec, value)
        } else {
            self.compile_comparison(spec, value).map(Predicate::from)
        };

        match &result {
            Ok(predicate) => {
                debug!(field = %spec.name, operator = %spec.operator, predicate = %predicate, "compiled criteria field");
            }
            Err(err) => {
                warn!(field = %spec.name, operator = %spec.operator, code = %err.code, "rejected criteria field");
            }
        }
        result
    }

    /// Compile a reflected field.
    pub fn compile_field(&self, field: &CriteriaField) -> QueryResult<Predicate> {
        self.compile(&field.spec, &field.value)
    }

    /// Reflect `criteria` and compile every applicable field, in order.
    ///
    /// Stops at the first failing field.
    pub fn compile_criteria<C: Criteria + ?Sized>(&self, criteria: &C) -> QueryResult<Vec<Predicate>> {
        reflect(criteria)?
            .iter()
            .map(|field| self.compile_field(field))
            .collect()
    }

    fn compile_blurry(&self, spec: &FieldSpec, value: &FilterValue) -> QueryResult<Predicate> {
        self.registry.rule(OperatorKind::InnerLike)?;
        let value = single_operand(spec, value)?;

        Ok(Predicate::or(spec.blurry_targets.iter().map(|target| {
            Predicate::from(Comparison::single(
                underscore_case(target),
                OperatorKind::InnerLike,
                value.clone(),
            ))
        })))
    }

    fn compile_comparison(&self, spec: &FieldSpec, value: &FilterValue) -> QueryResult<Comparison> {
        let rule = self.registry.rule(spec.operator)?;
        let column = spec.resolved_column();

        let operand = match rule.arity {
            Arity::None => Operand::None,
            Arity::One => Operand::Single(single_operand(spec, value)?.clone()),
            Arity::Two => match value.as_slice() {
                [lo, hi] => Operand::Range(lo.clone(), hi.clone()),
                _ => return Err(QueryError::invalid_range(&spec.name)),
            },
            Arity::Many => {
                let items = value.as_slice();
                if value.is_null() || items.is_empty() {
                    return Err(QueryError::empty_collection(&spec.name));
                }
                Operand::List(items.to_vec())
            }
        };

        Ok(Comparison::new(column, spec.operator, operand))
    }
}

fn single_operand<'v>(spec: &FieldSpec, value: &'v FilterValue) -> QueryResult<&'v FilterValue> {
    match value {
        FilterValue::List(_) => Err(QueryError::invalid_parameter(
            &spec.name,
            format!("{} expects a single value, found a list", spec.operator),
        )),
        other => Ok(other),
    }
}

/// Compile one field with every operator enabled.
pub fn compile(spec: &FieldSpec, value: &FilterValue) -> QueryResult<Predicate> {
    PredicateCompiler::standard().compile(spec, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    fn like(column: &str, value: &str) -> Predicate {
        Comparison::single(column, OperatorKind::InnerLike, value).into()
    }

    #[test]
    fn test_blurry_targets_form_an_or_group() {
        let spec = FieldSpec::new("keyword", OperatorKind::Equal).blurry(["nickname", "email"]);
        let predicate = compile(&spec, &"a".into()).unwrap();

        assert_eq!(
            predicate,
            Predicate::Or(vec![like("nickname", "a"), like("email", "a")])
        );
    }

    #[test]
    fn test_single_target_blurry_stays_grouped() {
        let spec = FieldSpec::new("keyword", OperatorKind::Equal).blurry(["nickname"]);
        let predicate = compile(&spec, &"a".into()).unwrap();
        assert_eq!(predicate, Predicate::Or(vec![like("nickname", "a")]));
    }

    #[test]
    fn test_blurry_targets_use_column_names() {
        let spec = FieldSpec::new("keyword", OperatorKind::InnerLike).blurry(["nickName", "email"]);
        let predicate = compile(&spec, &"a".into()).unwrap();
        assert_eq!(
            predicate,
            Predicate::Or(vec![like("nick_name", "a"), like("email", "a")])
        );
    }

    #[test]
    fn test_column_defaults_to_snake_case() {
        let spec = FieldSpec::new("createTime", OperatorKind::GreaterOrEqual);
        let predicate = compile(&spec, &"2024-01-01".into()).unwrap();

        assert_eq!(
            predicate,
            Predicate::from(Comparison::single(
                "create_time",
                OperatorKind::GreaterOrEqual,
                "2024-01-01"
            ))
        );
    }

    #[test]
    fn test_explicit_column_wins() {
        let spec = FieldSpec::new("createTime", OperatorKind::Equal).column("t.created_at");
        let predicate = compile(&spec, &1.into()).unwrap();
        assert_eq!(predicate.comparisons()[0].column, "t.created_at");
    }

    #[test]
    fn test_between_takes_bounds_positionally() {
        let spec = FieldSpec::new("age", OperatorKind::Between);
        let predicate = compile(&spec, &vec![30, 18].into()).unwrap();

        assert_eq!(
            predicate,
            Predicate::from(Comparison::new(
                "age",
                OperatorKind::Between,
                Operand::Range(FilterValue::Int(30), FilterValue::Int(18))
            ))
        );
    }

    #[test]
    fn test_between_requires_exactly_two_values() {
        let spec = FieldSpec::new("createTime", OperatorKind::Between);
        for value in [
            FilterValue::from(Vec::<i64>::new()),
            FilterValue::from(vec![1]),
            FilterValue::from(vec![1, 2, 3]),
            FilterValue::Int(1),
            FilterValue::Null,
        ] {
            let err = compile(&spec, &value).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidRange);
            assert!(err.message.contains("createTime"));
        }
    }

    #[test]
    fn test_in_requires_a_non_empty_sequence() {
        for operator in [OperatorKind::In, OperatorKind::NotIn] {
            let spec = FieldSpec::new("status", operator);
            let err = compile(&spec, &Vec::<i64>::new().into()).unwrap_err();
            assert_eq!(err.code, ErrorCode::EmptyCollection);
            assert!(err.message.contains("status"));
        }
    }

    #[test]
    fn test_in_promotes_a_scalar() {
        let spec = FieldSpec::new("status", OperatorKind::NotIn);
        let predicate = compile(&spec, &1.into()).unwrap();
        assert_eq!(
            predicate.comparisons()[0].operand,
            Operand::List(vec![FilterValue::Int(1)])
        );
    }

    #[test]
    fn test_null_tests_take_no_operand() {
        let spec = FieldSpec::new("deletedAt", OperatorKind::IsNull);
        let predicate = compile(&spec, &FilterValue::Null).unwrap();
        assert_eq!(
            predicate,
            Predicate::from(Comparison::new("deleted_at", OperatorKind::IsNull, Operand::None))
        );
    }

    #[test]
    fn test_like_operands_carry_the_raw_value() {
        let spec = FieldSpec::new("name", OperatorKind::LeftLike);
        let predicate = compile(&spec, &"ab".into()).unwrap();
        assert_eq!(
            predicate,
            Predicate::from(Comparison::single("name", OperatorKind::LeftLike, "ab"))
        );
    }

    #[test]
    fn test_scalar_operator_rejects_lists() {
        let spec = FieldSpec::new("age", OperatorKind::Equal);
        let err = compile(&spec, &vec![1, 2].into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameter);
    }

    #[test]
    fn test_restricted_registry_rejects_disabled_operators() {
        let registry = OperatorRegistry::standard().without(OperatorKind::RightLike);
        let compiler = PredicateCompiler::new(&registry);

        let err = compiler
            .compile(&FieldSpec::new("name", OperatorKind::RightLike), &"x".into())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperator);

        let registry = OperatorRegistry::restricted([OperatorKind::Equal]);
        let compiler = PredicateCompiler::new(&registry);
        let blurry = FieldSpec::new("q", OperatorKind::Equal).blurry(["a"]);
        let err = compiler.compile(&blurry, &"x".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperator);
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let spec = FieldSpec::new("keyword", OperatorKind::Equal).blurry(["a", "b", "c"]);
        let value = FilterValue::from("x");
        assert_eq!(compile(&spec, &value).unwrap(), compile(&spec, &value).unwrap());
    }

    #[test]
    fn test_compile_criteria_stops_at_first_error() {
        let fields = vec![
            CriteriaField::new(FieldSpec::new("age", OperatorKind::Equal), 18),
            CriteriaField::new(FieldSpec::new("range", OperatorKind::Between), vec![1]),
        ];
        let err = PredicateCompiler::standard()
            .compile_criteria(&fields)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRange);
    }
}
