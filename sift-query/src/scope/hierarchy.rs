//! Organization hierarchy lookups.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexSet;

use super::context::ScopeId;
use crate::error::QueryResult;

/// Expands a department into its subtree.
///
/// Implementations backed by I/O report failures as
/// [`ErrorCode::CollaboratorFailed`](crate::ErrorCode::CollaboratorFailed).
#[async_trait]
pub trait OrgHierarchy: Send + Sync {
    /// Every department below `dept_id`. Whether `dept_id` itself is part of
    /// the result does not matter; the resolver always includes it.
    async fn expand_subtree(&self, dept_id: &ScopeId) -> QueryResult<Vec<ScopeId>>;
}

#[async_trait]
impl<T: OrgHierarchy + ?Sized> OrgHierarchy for Arc<T> {
    async fn expand_subtree(&self, dept_id: &ScopeId) -> QueryResult<Vec<ScopeId>> {
        (**self).expand_subtree(dept_id).await
    }
}

/// An in-memory parent to children map.
///
/// An unknown department has no children, so the default value describes a
/// flat organization.
#[derive(Debug, Clone, Default)]
pub struct StaticOrgHierarchy {
    children: HashMap<ScopeId, Vec<ScopeId>>,
}

impl StaticOrgHierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `child` under `parent`.
    pub fn with_child(mut self, parent: impl Into<ScopeId>, child: impl Into<ScopeId>) -> Self {
        self.children
            .entry(parent.into())
            .or_default()
            .push(child.into());
        self
    }

    /// Breadth-first walk from `dept_id`, including it. Cycles are cut.
    pub fn subtree(&self, dept_id: &ScopeId) -> Vec<ScopeId> {
        let mut seen = IndexSet::new();
        seen.insert(dept_id.clone());

        let mut next = 0;
        while let Some(current) = seen.get_index(next).cloned() {
            if let Some(children) = self.children.get(&current) {
                seen.extend(children.iter().cloned());
            }
            next += 1;
        }
        seen.into_iter().collect()
    }
}

#[async_trait]
impl OrgHierarchy for StaticOrgHierarchy {
    async fn expand_subtree(&self, dept_id: &ScopeId) -> QueryResult<Vec<ScopeId>> {
        Ok(self.subtree(dept_id))
    }
}
