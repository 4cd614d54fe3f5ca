//! Role grants to scope predicate.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, warn};

use super::context::{AuthContext, DataScope, RoleContext, ScopeId};
use super::hierarchy::{OrgHierarchy, StaticOrgHierarchy};
use crate::error::{QueryError, QueryResult};
use crate::filter::{Comparison, Predicate};

/// Columns the scope predicates compare against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeColumns {
    /// Column holding the owning user id (`SELF`).
    pub owner: String,
    /// Column holding the owning department id (`DEPT`, `DEPT_AND_CHILD`, `CUSTOM`).
    pub dept: String,
}

impl Default for ScopeColumns {
    fn default() -> Self {
        Self::new("create_user", "dept_id")
    }
}

impl ScopeColumns {
    /// Create a column pair.
    pub fn new(owner: impl Into<String>, dept: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            dept: dept.into(),
        }
    }

    /// Qualify both columns with a table alias.
    pub fn with_alias(self, alias: &str) -> Self {
        Self {
            owner: format!("{}.{}", alias, self.owner),
            dept: format!("{}.{}", alias, self.dept),
        }
    }
}

/// Resolves an [`AuthContext`] into the predicate restricting visible rows.
///
/// Each role maps to one predicate and the role predicates are OR-combined:
/// holding any one qualifying role is enough. No role means no access.
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use sift_query::{AuthContext, Comparison, DataScope, Predicate, RoleContext, ScopeResolver};
///
/// let resolver = ScopeResolver::default();
/// let ctx = AuthContext::new("u1").with_role(RoleContext::new("r1", DataScope::Owner));
///
/// let scope = resolver.resolve(&ctx).await.unwrap();
/// assert_eq!(scope, Predicate::from(Comparison::equal("create_user", "u1")));
/// # }
/// ```
#[derive(Clone)]
pub struct ScopeResolver {
    columns: ScopeColumns,
    hierarchy: Arc<dyn OrgHierarchy>,
}

impl fmt::Debug for ScopeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeResolver")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new(ScopeColumns::default())
    }
}

impl ScopeResolver {
    /// Create a resolver over a flat organization.
    pub fn new(columns: ScopeColumns) -> Self {
        Self {
            columns,
            hierarchy: Arc::new(StaticOrgHierarchy::default()),
        }
    }

    /// Use `hierarchy` to expand `DEPT_AND_CHILD` grants.
    pub fn with_hierarchy(mut self, hierarchy: Arc<dyn OrgHierarchy>) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// The columns in use.
    pub fn columns(&self) -> &ScopeColumns {
        &self.columns
    }

    /// Resolve every role of `ctx` into one predicate.
    ///
    /// Any failing role fails the whole call.
    pub async fn resolve(&self, ctx: &AuthContext) -> QueryResult<Predicate> {
        let mut per_role: Vec<Predicate> = Vec::with_capacity(ctx.roles.len());
        for role in &ctx.roles {
            let predicate = match self.resolve_role(role, ctx).await {
                Ok(predicate) => predicate,
                Err(err) => {
                    warn!(role = %role.role_id, scope = %role.data_scope, code = %err.code, "rejected role grant");
                    return Err(err);
                }
            };
            if !per_role.contains(&predicate) {
                per_role.push(predicate);
            }
        }

        let scope = Predicate::any(per_role);
        debug!(user = %ctx.user_id, roles = ctx.roles.len(), scope = %scope, "resolved data scope");
        Ok(scope)
    }

    /// Resolve a single role grant for the acting user in `ctx`.
    pub async fn resolve_role(&self, role: &RoleContext, ctx: &AuthContext) -> QueryResult<Predicate> {
        let predicate = match role.data_scope {
            DataScope::All => Predicate::always_true(),
            DataScope::Owner => Comparison::equal(&self.columns.owner, &ctx.user_id).into(),
            DataScope::Dept => {
                let dept_id = acting_dept(role, ctx)?;
                Comparison::equal(&self.columns.dept, dept_id).into()
            }
            DataScope::DeptAndChild => {
                let dept_id = acting_dept(role, ctx)?;
                let subtree = self.hierarchy.expand_subtree(dept_id).await?;

                let mut ids = IndexSet::with_capacity(subtree.len() + 1);
                ids.insert(dept_id.clone());
                ids.extend(subtree);
                Comparison::in_list(&self.columns.dept, ids).into()
            }
            DataScope::Custom => {
                if role.custom_dept_ids.is_empty() {
                    return Err(QueryError::missing_scope_data(
                        &role.role_id,
                        "CUSTOM scope without departments",
                    ));
                }
                let ids: IndexSet<&ScopeId> = role.custom_dept_ids.iter().collect();
                Comparison::in_list(&self.columns.dept, ids).into()
            }
        };
        Ok(predicate)
    }
}

fn acting_dept<'c>(role: &RoleContext, ctx: &'c AuthContext) -> QueryResult<&'c ScopeId> {
    ctx.dept_id.as_ref().ok_or_else(|| {
        QueryError::missing_scope_data(
            &role.role_id,
            format!("{} scope but user {} has no department", role.data_scope, ctx.user_id),
        )
    })
}
