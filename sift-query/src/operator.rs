//! Comparison operators and the registry that describes them.
//!
//! Each [`OperatorKind`] maps to an [`OperatorRule`]: how many operands it
//! takes, whether it is still applied when the criteria field is empty, and
//! where a LIKE wildcard goes. The rules are data; turning a rule into SQL is
//! the job of the execution adapter ([`crate::sql`]).
//!
//! ```rust
//! use sift_query::{Arity, OperatorKind, OperatorRegistry};
//!
//! let rule = OperatorRegistry::standard().rule(OperatorKind::Between).unwrap();
//! assert_eq!(rule.arity, Arity::Two);
//!
//! let kind: OperatorKind = "inner_like".parse().unwrap();
//! assert_eq!(kind, OperatorKind::InnerLike);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// The supported comparison kinds.
///
/// Discriminants are the stable numeric codes used by serialized criteria
/// schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum OperatorKind {
    /// `column = value`
    Equal = 1,
    /// `column != value`
    NotEqual = 2,
    /// `column > value`
    GreaterThan = 3,
    /// `column < value`
    LessThan = 4,
    /// `column >= value`
    #[serde(alias = "GREATER_THAN_OR_EQUAL")]
    GreaterOrEqual = 5,
    /// `column <= value`
    #[serde(alias = "LESS_THAN_OR_EQUAL")]
    LessOrEqual = 6,
    /// `column BETWEEN lo AND hi`
    Between = 7,
    /// `column LIKE 'value%'`
    LeftLike = 8,
    /// `column LIKE '%value%'`
    InnerLike = 9,
    /// `column LIKE '%value'`
    RightLike = 10,
    /// `column IN (values)`
    In = 11,
    /// `column NOT IN (values)`
    NotIn = 12,
    /// `column IS NULL`
    IsNull = 13,
    /// `column IS NOT NULL`
    IsNotNull = 14,
}

impl OperatorKind {
    /// Every operator, in code order.
    pub const ALL: [OperatorKind; 14] = [
        Self::Equal,
        Self::NotEqual,
        Self::GreaterThan,
        Self::LessThan,
        Self::GreaterOrEqual,
        Self::LessOrEqual,
        Self::Between,
        Self::LeftLike,
        Self::InnerLike,
        Self::RightLike,
        Self::In,
        Self::NotIn,
        Self::IsNull,
        Self::IsNotNull,
    ];

    /// The numeric code of this operator.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up an operator by its numeric code.
    pub fn from_code(code: u8) -> QueryResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.code() == code)
            .ok_or_else(|| QueryError::unsupported_operator(code))
    }

    /// The canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "EQUAL",
            Self::NotEqual => "NOT_EQUAL",
            Self::GreaterThan => "GREATER_THAN",
            Self::LessThan => "LESS_THAN",
            Self::GreaterOrEqual => "GREATER_OR_EQUAL",
            Self::LessOrEqual => "LESS_OR_EQUAL",
            Self::Between => "BETWEEN",
            Self::LeftLike => "LEFT_LIKE",
            Self::InnerLike => "INNER_LIKE",
            Self::RightLike => "RIGHT_LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
            Self::IsNull => "IS_NULL",
            Self::IsNotNull => "IS_NOT_NULL",
        }
    }

    /// Short human-readable form, e.g. `">="` or `"LIKE '%s%'"`.
    pub fn description(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Between => "BETWEEN",
            Self::LeftLike => "LIKE 's%'",
            Self::InnerLike => "LIKE '%s%'",
            Self::RightLike => "LIKE '%s'",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    /// The built-in rule for this operator.
    pub fn rule(self) -> &'static OperatorRule {
        &STANDARD_RULES[usize::from(self.code()) - 1]
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "GREATER_THAN_OR_EQUAL" => return Ok(Self::GreaterOrEqual),
            "LESS_THAN_OR_EQUAL" => return Ok(Self::LessOrEqual),
            _ => {}
        }
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| QueryError::unsupported_operator(s))
    }
}

/// How many operands an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// No operand (null tests).
    None,
    /// Exactly one operand.
    One,
    /// An ordered pair.
    Two,
    /// A non-empty sequence.
    Many,
}

/// Wildcard placement for the LIKE family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikePattern {
    /// Trailing wildcard only: `value%`.
    StartsWith,
    /// Wildcards on both sides: `%value%`.
    Contains,
    /// Leading wildcard only: `%value`.
    EndsWith,
}

impl LikePattern {
    /// Wrap an already-escaped value with this pattern's wildcards.
    pub fn wrap(self, escaped: &str) -> String {
        match self {
            Self::StartsWith => format!("{}%", escaped),
            Self::Contains => format!("%{}%", escaped),
            Self::EndsWith => format!("%{}", escaped),
        }
    }
}

/// The construction rule for one operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorRule {
    /// The operator this rule describes.
    pub kind: OperatorKind,
    /// Operand arity.
    pub arity: Arity,
    /// Whether the operator is applied when the field value is empty.
    pub accepts_empty: bool,
    /// Wildcard placement, for the LIKE family.
    pub like: Option<LikePattern>,
}

impl OperatorRule {
    const fn new(kind: OperatorKind, arity: Arity) -> Self {
        Self {
            kind,
            arity,
            accepts_empty: matches!(arity, Arity::None),
            like: None,
        }
    }

    const fn like(kind: OperatorKind, pattern: LikePattern) -> Self {
        Self {
            kind,
            arity: Arity::One,
            accepts_empty: false,
            like: Some(pattern),
        }
    }
}

/// Rule table indexed by `code - 1`.
const STANDARD_RULES: [OperatorRule; 14] = [
    OperatorRule::new(OperatorKind::Equal, Arity::One),
    OperatorRule::new(OperatorKind::NotEqual, Arity::One),
    OperatorRule::new(OperatorKind::GreaterThan, Arity::One),
    OperatorRule::new(OperatorKind::LessThan, Arity::One),
    OperatorRule::new(OperatorKind::GreaterOrEqual, Arity::One),
    OperatorRule::new(OperatorKind::LessOrEqual, Arity::One),
    OperatorRule::new(OperatorKind::Between, Arity::Two),
    OperatorRule::like(OperatorKind::LeftLike, LikePattern::StartsWith),
    OperatorRule::like(OperatorKind::InnerLike, LikePattern::Contains),
    OperatorRule::like(OperatorKind::RightLike, LikePattern::EndsWith),
    OperatorRule::new(OperatorKind::In, Arity::Many),
    OperatorRule::new(OperatorKind::NotIn, Arity::Many),
    OperatorRule::new(OperatorKind::IsNull, Arity::None),
    OperatorRule::new(OperatorKind::IsNotNull, Arity::None),
];

static STANDARD: LazyLock<OperatorRegistry> =
    LazyLock::new(|| OperatorRegistry::from_rules(STANDARD_RULES));

/// Immutable mapping from operator to construction rule.
///
/// The compiler refuses any operator missing from the registry it was given,
/// which lets a deployment switch off operators it does not want clients to
/// reach (for instance leading-wildcard scans).
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorRegistry {
    rules: IndexMap<OperatorKind, OperatorRule>,
}

impl OperatorRegistry {
    fn from_rules(rules: impl IntoIterator<Item = OperatorRule>) -> Self {
        Self {
            rules: rules.into_iter().map(|r| (r.kind, r)).collect(),
        }
    }

    /// The registry holding every operator.
    pub fn standard() -> &'static OperatorRegistry {
        &STANDARD
    }

    /// A registry holding only the given operators.
    pub fn restricted(kinds: impl IntoIterator<Item = OperatorKind>) -> Self {
        Self::from_rules(kinds.into_iter().map(|k| *k.rule()))
    }

    /// A copy of this registry without the given operator.
    pub fn without(&self, kind: OperatorKind) -> Self {
        let mut rules = self.rules.clone();
        rules.shift_remove(&kind);
        Self { rules }
    }

    /// Look up the rule for an operator.
    pub fn rule(&self, kind: OperatorKind) -> QueryResult<&OperatorRule> {
        self.rules
            .get(&kind)
            .ok_or_else(|| QueryError::unsupported_operator(kind))
    }

    /// Check whether an operator is enabled.
    pub fn contains(&self, kind: OperatorKind) -> bool {
        self.rules.contains_key(&kind)
    }

    /// Enabled operators in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = OperatorKind> + '_ {
        self.rules.keys().copied()
    }

    /// Number of enabled operators.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if no operator is enabled.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::standard().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_rule_table_is_indexed_by_code() {
        for kind in OperatorKind::ALL {
            assert_eq!(kind.rule().kind, kind);
        }
    }

    #[test]
    fn test_only_null_tests_accept_empty_values() {
        for kind in OperatorKind::ALL {
            let expected = matches!(kind, OperatorKind::IsNull | OperatorKind::IsNotNull);
            assert_eq!(kind.rule().accepts_empty, expected, "{kind}");
        }
    }

    #[test]
    fn test_arity() {
        assert_eq!(OperatorKind::Equal.rule().arity, Arity::One);
        assert_eq!(OperatorKind::Between.rule().arity, Arity::Two);
        assert_eq!(OperatorKind::NotIn.rule().arity, Arity::Many);
        assert_eq!(OperatorKind::IsNotNull.rule().arity, Arity::None);
    }

    #[test]
    fn test_like_patterns() {
        assert_eq!(OperatorKind::LeftLike.rule().like, Some(LikePattern::StartsWith));
        assert_eq!(OperatorKind::InnerLike.rule().like, Some(LikePattern::Contains));
        assert_eq!(OperatorKind::RightLike.rule().like, Some(LikePattern::EndsWith));
        assert_eq!(OperatorKind::Equal.rule().like, None);

        assert_eq!(LikePattern::StartsWith.wrap("ab"), "ab%");
        assert_eq!(LikePattern::Contains.wrap("ab"), "%ab%");
        assert_eq!(LikePattern::EndsWith.wrap("ab"), "%ab");
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("EQUAL".parse::<OperatorKind>().unwrap(), OperatorKind::Equal);
        assert_eq!("not_in".parse::<OperatorKind>().unwrap(), OperatorKind::NotIn);
        assert_eq!(
            "GREATER_THAN_OR_EQUAL".parse::<OperatorKind>().unwrap(),
            OperatorKind::GreaterOrEqual
        );

        let err = "SOUNDS_LIKE".parse::<OperatorKind>().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperator);
    }

    #[test]
    fn test_codes() {
        assert_eq!(OperatorKind::Equal.code(), 1);
        assert_eq!(OperatorKind::IsNotNull.code(), 14);
        assert_eq!(OperatorKind::from_code(7).unwrap(), OperatorKind::Between);
        assert_eq!(
            OperatorKind::from_code(42).unwrap_err().code,
            ErrorCode::UnsupportedOperator
        );
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&OperatorKind::InnerLike).unwrap();
        assert_eq!(json, "\"INNER_LIKE\"");
        let kind: OperatorKind = serde_json::from_str("\"LESS_THAN_OR_EQUAL\"").unwrap();
        assert_eq!(kind, OperatorKind::LessOrEqual);
    }

    #[test]
    fn test_restricted_registry() {
        let registry = OperatorRegistry::standard().without(OperatorKind::RightLike);
        assert_eq!(registry.len(), 13);
        assert!(!registry.contains(OperatorKind::RightLike));
        assert_eq!(
            registry.rule(OperatorKind::RightLike).unwrap_err().code,
            ErrorCode::UnsupportedOperator
        );

        let registry = OperatorRegistry::restricted([OperatorKind::Equal, OperatorKind::In]);
        assert_eq!(
            registry.kinds().collect::<Vec<_>>(),
            vec![OperatorKind::Equal, OperatorKind::In]
        );
    }
}
