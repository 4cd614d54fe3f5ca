//! Per-request authorization flow.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::context::AuthContext;
use super::resolver::ScopeResolver;
use crate::assembler::{QueryAssembler, assemble};
use crate::criteria::Criteria;
use crate::error::QueryResult;
use crate::filter::Predicate;
use crate::operator::OperatorRegistry;

/// Supplies the acting user and their role grants for the current request.
///
/// Implementations are expected to read session state; nothing here caches
/// the result across calls.
#[async_trait]
pub trait AuthContextProvider: Send + Sync {
    /// The authorization snapshot for the current request.
    async fn current(&self) -> QueryResult<AuthContext>;
}

#[async_trait]
impl<T: AuthContextProvider + ?Sized> AuthContextProvider for Arc<T> {
    async fn current(&self) -> QueryResult<AuthContext> {
        (**self).current().await
    }
}

/// A provider that always returns the same context.
#[derive(Debug, Clone)]
pub struct StaticAuthContextProvider {
    context: AuthContext,
}

impl StaticAuthContextProvider {
    /// Create a provider returning `context`.
    pub fn new(context: AuthContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl AuthContextProvider for StaticAuthContextProvider {
    async fn current(&self) -> QueryResult<AuthContext> {
        Ok(self.context.clone())
    }
}

/// Builds the final, scoped filter for a request.
///
/// `scoped_filter` always resolves the scope; there is no switch that skips
/// it.
#[derive(Clone)]
pub struct DataScopeService {
    provider: Arc<dyn AuthContextProvider>,
    resolver: ScopeResolver,
    registry: OperatorRegistry,
}

impl fmt::Debug for DataScopeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataScopeService")
            .field("resolver", &self.resolver)
            .field("operators", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl DataScopeService {
    /// Create a service accepting every operator.
    pub fn new(provider: Arc<dyn AuthContextProvider>, resolver: ScopeResolver) -> Self {
        Self {
            provider,
            resolver,
            registry: OperatorRegistry::standard().clone(),
        }
    }

    /// Only accept operators in `registry`.
    pub fn with_registry(mut self, registry: OperatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The resolver in use.
    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    /// The scope predicate for the current request.
    pub async fn scope_predicate(&self) -> QueryResult<Predicate> {
        let ctx = self.provider.current().await?;
        self.resolver.resolve(&ctx).await
    }

    /// Build `criteria` and conjoin it with the current request's scope.
    ///
    /// The criteria are compiled first, so a malformed request fails before
    /// any collaborator is called.
    pub async fn scoped_filter<C: Criteria + ?Sized>(&self, criteria: &C) -> QueryResult<Predicate> {
        let user = QueryAssembler::new(&self.registry).build(criteria)?;
        let scope = self.scope_predicate().await?;
        Ok(assemble(user, scope))
    }
}
