//! The predicate tree.
//!
//! [`Predicate`] is the backend-agnostic query IR: comparison leaves combined
//! with AND, OR and NOT. The empty groups are the identity elements,
//! `And{}` is always-true and `Or{}` is always-false.
//!
//! Two families of constructors exist:
//!
//! - [`Predicate::and`] / [`Predicate::or`] build a group exactly as given.
//!   The compiler uses them for fuzzy groups, which must never be flattened.
//! - [`Predicate::all`] / [`Predicate::any`] normalise identity elements and
//!   unwrap single children, producing minimal trees.
//!
//! ```rust
//! use sift_query::{Comparison, OperatorKind, Predicate};
//!
//! let owned = Predicate::from(Comparison::single("create_user", OperatorKind::Equal, "u1"));
//! let scope = Predicate::any([owned.clone(), Predicate::always_false()]);
//! assert_eq!(scope, owned);
//!
//! assert!(Predicate::any([owned, Predicate::always_true()]).is_always_true());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operator::OperatorKind;
use crate::value::FilterValue;

/// The operand(s) of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// No operand (null tests).
    None,
    /// One value.
    Single(FilterValue),
    /// An ordered `(lo, hi)` pair.
    Range(FilterValue, FilterValue),
    /// A non-empty sequence.
    List(Vec<FilterValue>),
}

impl Operand {
    /// Values in binding order.
    pub fn values(&self) -> Vec<&FilterValue> {
        match self {
            Self::None => Vec::new(),
            Self::Single(v) => vec![v],
            Self::Range(lo, hi) => vec![lo, hi],
            Self::List(items) => items.iter().collect(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Single(v) => write!(f, " {}", v),
            Self::Range(lo, hi) => write!(f, " {} AND {}", lo, hi),
            Self::List(items) => write!(f, " {}", FilterValue::List(items.clone())),
        }
    }
}

/// A leaf comparison of one column against its operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Column name, possibly qualified (`t.dept_id`).
    pub column: String,
    /// Comparison operator.
    pub operator: OperatorKind,
    /// Operand(s).
    pub operand: Operand,
}

impl Comparison {
    /// Create a comparison.
    pub fn new(column: impl Into<String>, operator: OperatorKind, operand: Operand) -> Self {
        Self {
            column: column.into(),
            operator,
            operand,
        }
    }

    /// A single-operand comparison.
    pub fn single(
        column: impl Into<String>,
        operator: OperatorKind,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self::new(column, operator, Operand::Single(value.into()))
    }

    /// `column = value`.
    pub fn equal(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::single(column, OperatorKind::Equal, value)
    }

    /// `column IN (values)`.
    pub fn in_list<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Self::new(
            column,
            OperatorKind::In,
            Operand::List(values.into_iter().map(Into::into).collect()),
        )
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.column, self.operator, self.operand)
    }
}

/// A node of the predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// A leaf comparison.
    Comparison(Comparison),
    /// Conjunction. Empty means always-true.
    And(Vec<Predicate>),
    /// Disjunction. Empty means always-false.
    Or(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>),
}

impl Predicate {
    /// The always-true predicate, `And{}`.
    pub fn always_true() -> Self {
        Self::And(Vec::new())
    }

    /// The always-false predicate, `Or{}`.
    pub fn always_false() -> Self {
        Self::Or(Vec::new())
    }

    /// Whether the predicate holds for every row, judged structurally.
    pub fn is_always_true(&self) -> bool {
        match self {
            Self::Comparison(_) => false,
            Self::And(children) => children.iter().all(Self::is_always_true),
            Self::Or(children) => children.iter().any(Self::is_always_true),
            Self::Not(inner) => inner.is_always_false(),
        }
    }

    /// Whether the predicate holds for no row, judged structurally.
    pub fn is_always_false(&self) -> bool {
        match self {
            Self::Comparison(_) => false,
            Self::And(children) => children.iter().any(Self::is_always_false),
            Self::Or(children) => children.iter().all(Self::is_always_false),
            Self::Not(inner) => inner.is_always_true(),
        }
    }

    /// A conjunction of exactly `children`.
    pub fn and(children: impl IntoIterator<Item = Predicate>) -> Self {
        Self::And(children.into_iter().collect())
    }

    /// A disjunction of exactly `children`.
    pub fn or(children: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Or(children.into_iter().collect())
    }

    /// A minimal conjunction.
    ///
    /// Always-true children are dropped, an always-false child makes the
    /// whole result always-false, and a single remaining child is returned
    /// as is.
    pub fn all(children: impl IntoIterator<Item = Predicate>) -> Self {
        let mut kept = Vec::new();
        for child in children {
            if child.is_always_false() {
                return Self::always_false();
            }
            if !child.is_always_true() {
                kept.push(child);
            }
        }
        Self::unwrap_single(kept, Self::And)
    }

    /// A minimal disjunction.
    ///
    /// Always-false children are dropped, an always-true child makes the
    /// whole result always-true, and a single remaining child is returned
    /// as is.
    pub fn any(children: impl IntoIterator<Item = Predicate>) -> Self {
        let mut kept = Vec::new();
        for child in children {
            if child.is_always_true() {
                return Self::always_true();
            }
            if !child.is_always_false() {
                kept.push(child);
            }
        }
        Self::unwrap_single(kept, Self::Or)
    }

    fn unwrap_single(mut kept: Vec<Predicate>, group: fn(Vec<Predicate>) -> Predicate) -> Self {
        match kept.pop() {
            Some(only) if kept.is_empty() => only,
            Some(last) => {
                kept.push(last);
                group(kept)
            }
            None => group(kept),
        }
    }

    /// Negate a predicate. The identity elements swap.
    pub fn not(predicate: Predicate) -> Self {
        if predicate.is_always_true() {
            return Self::always_false();
        }
        if predicate.is_always_false() {
            return Self::always_true();
        }
        Self::Not(Box::new(predicate))
    }

    /// Direct children of a group, empty for leaves.
    pub fn children(&self) -> &[Predicate] {
        match self {
            Self::And(children) | Self::Or(children) => children,
            Self::Not(inner) => std::slice::from_ref(inner.as_ref()),
            Self::Comparison(_) => &[],
        }
    }

    /// Every comparison in the tree, depth first.
    pub fn comparisons(&self) -> Vec<&Comparison> {
        let mut out = Vec::new();
        self.collect_comparisons(&mut out);
        out
    }

    fn collect_comparisons<'a>(&'a self, out: &mut Vec<&'a Comparison>) {
        match self {
            Self::Comparison(c) => out.push(c),
            other => {
                for child in other.children() {
                    child.collect_comparisons(out);
                }
            }
        }
    }

    /// Nesting depth; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Self::depth).max().unwrap_or(0)
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::always_true()
    }
}

impl From<Comparison> for Predicate {
    fn from(c: Comparison) -> Self {
        Self::Comparison(c)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison(c) => write!(f, "{}", c),
            Self::And(children) if children.is_empty() => f.write_str("TRUE"),
            Self::Or(children) if children.is_empty() => f.write_str("FALSE"),
            Self::And(children) => write_group(f, children, " AND "),
            Self::Or(children) => write_group(f, children, " OR "),
            Self::Not(inner) => write!(f, "NOT ({})", inner),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, children: &[Predicate], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", child)?;
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(column: &str) -> Predicate {
        Comparison::equal(column, 1).into()
    }

    #[test]
    fn test_identity_elements() {
        assert!(Predicate::always_true().is_always_true());
        assert!(Predicate::always_false().is_always_false());
        assert!(!Predicate::always_true().is_always_false());
        assert!(!leaf("a").is_always_true());
        assert!(!leaf("a").is_always_false());
    }

    #[test]
    fn test_structural_recognition() {
        let nested_true = Predicate::and([Predicate::always_true(), Predicate::and(vec![Predicate::always_true()])]);
        assert!(nested_true.is_always_true());

        let or_with_true = Predicate::or([leaf("a"), Predicate::always_true()]);
        assert!(or_with_true.is_always_true());

        let and_with_false = Predicate::and([leaf("a"), Predicate::always_false()]);
        assert!(and_with_false.is_always_false());

        assert!(Predicate::Not(Box::new(Predicate::always_false())).is_always_true());
    }

    #[test]
    fn test_raw_groups_are_kept_as_given() {
        let group = Predicate::or([leaf("a")]);
        assert_eq!(group, Predicate::Or(vec![leaf("a")]));

        let outer = Predicate::and([Predicate::or([leaf("a"), leaf("b")]), leaf("c")]);
        assert_eq!(outer.children().len(), 2);
        assert!(matches!(outer.children()[0], Predicate::Or(_)));
    }

    #[test]
    fn test_any_normalises() {
        assert_eq!(Predicate::any(Vec::new()), Predicate::always_false());
        assert_eq!(Predicate::any([leaf("a")]), leaf("a"));
        assert_eq!(
            Predicate::any([leaf("a"), Predicate::always_false(), leaf("b")]),
            Predicate::Or(vec![leaf("a"), leaf("b")])
        );
        assert_eq!(
            Predicate::any([leaf("a"), Predicate::always_true()]),
            Predicate::always_true()
        );
    }

    #[test]
    fn test_all_normalises() {
        assert_eq!(Predicate::all(Vec::new()), Predicate::always_true());
        assert_eq!(Predicate::all([Predicate::always_true(), leaf("a")]), leaf("a"));
        assert_eq!(
            Predicate::all([leaf("a"), Predicate::always_false()]),
            Predicate::always_false()
        );
    }

    #[test]
    fn test_not_swaps_identities() {
        assert_eq!(Predicate::not(Predicate::always_true()), Predicate::always_false());
        assert_eq!(Predicate::not(Predicate::always_false()), Predicate::always_true());
        assert_eq!(
            Predicate::not(leaf("a")),
            Predicate::Not(Box::new(leaf("a")))
        );
    }

    #[test]
    fn test_comparisons_and_depth() {
        let tree = Predicate::and([Predicate::or([leaf("a"), leaf("b")]), leaf("c")]);
        let columns: Vec<_> = tree.comparisons().iter().map(|c| c.column.as_str()).collect();
        assert_eq!(columns, vec!["a", "b", "c"]);
        assert_eq!(tree.depth(), 3);
        assert_eq!(leaf("a").depth(), 1);
    }

    #[test]
    fn test_display() {
        let tree = Predicate::and([
            Predicate::or([
                Predicate::from(Comparison::single("nickname", OperatorKind::InnerLike, "a")),
                Predicate::from(Comparison::single("email", OperatorKind::InnerLike, "a")),
            ]),
            Predicate::from(Comparison::equal("age", 18)),
        ]);
        assert_eq!(
            tree.to_string(),
            "((nickname INNER_LIKE 'a' OR email INNER_LIKE 'a') AND age EQUAL 18)"
        );
        assert_eq!(Predicate::always_true().to_string(), "TRUE");
        assert_eq!(
            Comparison::in_list("dept_id", [1, 2]).to_string(),
            "dept_id IN (1, 2)"
        );
    }
}
