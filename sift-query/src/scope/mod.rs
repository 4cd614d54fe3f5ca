//! Row-level data scoping.
//!
//! A caller holds one or more role grants, each with a [`DataScope`]. The
//! [`ScopeResolver`] turns the grants into one predicate over the owner and
//! department columns:
//!
//! | Scope | Predicate |
//! |-------|-----------|
//! | `ALL` | always-true |
//! | `SELF` | `owner = user_id` |
//! | `DEPT` | `dept = dept_id` |
//! | `DEPT_AND_CHILD` | `dept IN (dept_id and its subtree)` |
//! | `CUSTOM` | `dept IN (role's departments)` |
//!
//! Role predicates are OR-combined; no role at all resolves to always-false.
//! The scope predicate is then AND-combined with the user's criteria through
//! [`assemble`](crate::assemble), or in one step by [`DataScopeService`].
//!
//! The identity provider ([`AuthContextProvider`]) and the org hierarchy
//! ([`OrgHierarchy`]) are collaborators supplied by the host application.

mod context;
mod hierarchy;
mod provider;
mod resolver;

pub use context::{AuthContext, DataScope, RoleContext, ScopeId};
pub use hierarchy::{OrgHierarchy, StaticOrgHierarchy};
pub use provider::{AuthContextProvider, DataScopeService, StaticAuthContextProvider};
pub use resolver::{ScopeColumns, ScopeResolver};
