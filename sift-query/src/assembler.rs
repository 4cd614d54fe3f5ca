//! Builds the user predicate and merges it with the scope predicate.
//!
//! [`build`] turns a whole criteria value into one predicate; [`assemble`] is
//! the only place a user predicate meets a scope predicate. Every path that
//! produces a final query filter goes through `assemble`.
//!
//! ```rust
//! use sift_query::{assemble, build, Comparison, CriteriaField, FieldSpec, OperatorKind, Predicate};
//!
//! let criteria = vec![CriteriaField::new(FieldSpec::new("age", OperatorKind::Equal), 18)];
//! let user = build(&criteria).unwrap();
//! let scope = Predicate::from(Comparison::equal("create_user", "u1"));
//!
//! let filter = assemble(user.clone(), scope.clone());
//! assert_eq!(filter, Predicate::and([user, scope]));
//! ```

use tracing::debug;

use crate::compiler::PredicateCompiler;
use crate::criteria::Criteria;
use crate::error::QueryResult;
use crate::filter::Predicate;
use crate::operator::OperatorRegistry;

/// Compile every applicable field of `criteria` and conjoin the results.
///
/// Returns `And{}` when the criteria value is absent or yields no fields,
/// which callers treat as "no restriction".
pub fn build<C: Criteria + ?Sized>(criteria: &C) -> QueryResult<Predicate> {
    QueryAssembler::standard().build(criteria)
}

/// Conjoin a user predicate with a scope predicate.
///
/// An always-true side is dropped, so `assemble(p, And{})` is `p` and
/// `assemble(And{}, s)` is `s`. Otherwise an always-false side makes the
/// result always-false. The two sides are never flattened into each other.
pub fn assemble(user: Predicate, scope: Predicate) -> Predicate {
    let assembled = if scope.is_always_true() {
        user
    } else if user.is_always_true() {
        scope
    } else if user.is_always_false() || scope.is_always_false() {
        Predicate::always_false()
    } else {
        Predicate::and([user, scope])
    };

    debug!(filter = %assembled, "assembled scoped filter");
    assembled
}

/// Builds and assembles predicates against one operator registry.
#[derive(Debug, Clone, Copy)]
pub struct QueryAssembler<'r> {
    compiler: PredicateCompiler<'r>,
}

impl Default for QueryAssembler<'static> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'r> QueryAssembler<'r> {
    /// Create an assembler accepting only operators in `registry`.
    pub fn new(registry: &'r OperatorRegistry) -> Self {
        Self {
            compiler: PredicateCompiler::new(registry),
        }
    }

    /// An assembler accepting every operator.
    pub fn standard() -> QueryAssembler<'static> {
        QueryAssembler {
            compiler: PredicateCompiler::standard(),
        }
    }

    /// The compiler in use.
    pub fn compiler(&self) -> &PredicateCompiler<'r> {
        &self.compiler
    }

    /// See [`build`].
    pub fn build<C: Criteria + ?Sized>(&self, criteria: &C) -> QueryResult<Predicate> {
        let predicates = self.compiler.compile_criteria(criteria)?;
        debug!(fields = predicates.len(), "built criteria predicate");
        Ok(Predicate::and(predicates))
    }

    /// Build `criteria` and conjoin it with `scope`.
    pub fn scoped<C: Criteria + ?Sized>(&self, criteria: &C, scope: Predicate) -> QueryResult<Predicate> {
        Ok(assemble(self.build(criteria)?, scope))
    }
}
