//! Resolver context for dependency injection.
//!
//! This module contains the ResolverContext type which provides
//! the interface for factory functions to resolve dependencies.

use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

use super::{Resolution, ServiceProvider};

/// Context passed to factory functions for resolving dependencies.
///
/// Resolutions made through the context continue the resolution that invoked
/// the factory: they see the same scope and the same in-progress path, so a
/// factory that (indirectly) asks for its own service gets a
/// [`DiError::Circular`](crate::DiError::Circular) error instead of recursing.
///
/// # Examples
///
/// ```
/// use keel_di::{ServiceCollection, Resolver, Lifetime};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database>, lifetime: Lifetime }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton_instance(Database { url: "postgres://localhost".to_string() });
/// services.add_transient_factory::<UserService, _>(|ctx| {
///     Ok(UserService {
///         db: ctx.get::<Database>()?,
///         lifetime: ctx.lifetime(),
///     })
/// });
///
/// let provider = services.build();
/// let users = provider.get_required::<UserService>();
/// assert_eq!(users.db.url, "postgres://localhost");
/// assert_eq!(users.lifetime, Lifetime::Transient);
/// ```
pub struct ResolverContext<'a> {
    resolution: &'a Resolution<'a>,
    lifetime: Lifetime,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(resolution: &'a Resolution<'a>, lifetime: Lifetime) -> Self {
        Self {
            resolution,
            lifetime,
        }
    }

    /// Lifetime of the service being built.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// The root provider, e.g. for factories that create their own scopes.
    pub fn provider(&self) -> &ServiceProvider {
        self.resolution.provider()
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolution.resolve(key)
    }

    /// Singleton builds hand their hooks to the provider; Scoped and
    /// Transient builds inside a scope hand them to that scope.
    fn push_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.resolution.push_disposer(self.lifetime, f);
    }
}
