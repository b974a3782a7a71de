//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type, the resolution algorithm
//! shared by the provider and its scopes, and the context handed to factories.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;

use crate::config::{ContainerOptions, ScopedFromRoot};
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::graph_export::DependencyGraph;
use crate::internal::{DisposeBag, Disposer, PathGuard, ResolutionPath};
use crate::key::{key_of_type, Key};
use crate::lifetime::Lifetime;
use crate::metadata::{effective_parameters, Arguments, MetadataSource};
use crate::observer::Observers;
use crate::registration::{Activator, AnyArc, Registration, Registry};
use crate::traits::ResolverCore;
use crate::validation::ValidationReport;

pub mod context;
pub mod scope;
pub use context::ResolverContext;
pub use scope::Scope;
use scope::ScopeStorage;

/// String token under which every provider resolves to itself.
pub const PROVIDER_TOKEN: &str = "ServiceProvider";

/// Service provider for resolving dependencies from the DI container.
///
/// The provider is the root resolution context. It owns the registrations,
/// the metadata source and the singleton slots; scopes created from it share
/// all of these. Cloning a provider is cheap and yields a handle to the same
/// container.
///
/// # Thread Safety
///
/// `ServiceProvider` is `Send + Sync`. Each singleton slot is locked across
/// its check-then-create step, so a singleton is built at most once even
/// when several threads race for it.
///
/// # Self-resolution
///
/// Resolving `ServiceProvider` (or [`PROVIDER_TOKEN`]) yields a detached
/// handle that does not keep the container alive, so a singleton may hold it
/// without leaking the container. Once every owning handle and scope is gone,
/// resolving through a detached handle fails with
/// [`DiError::ProviderDropped`]. Clone the provider itself to get an owning
/// handle.
///
/// # Examples
///
/// ```
/// use keel_di::{ServiceCollection, Resolver, ServiceProvider, PROVIDER_TOKEN};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton_instance(Database { url: "postgres://localhost".to_string() });
/// collection.add_transient_factory::<UserService, _>(|ctx| {
///     Ok(UserService { db: ctx.get::<Database>()? })
/// });
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
///
/// // The provider resolves to itself
/// let me = provider.get_required::<ServiceProvider>();
/// assert!(me.same_provider(&provider));
/// let by_token = provider.get_token::<ServiceProvider>(PROVIDER_TOKEN).unwrap();
/// assert!(by_token.same_provider(&provider));
/// ```
pub struct ServiceProvider {
    handle: Handle,
}

enum Handle {
    Owned(Arc<ProviderInner>),
    /// Produced by self-resolution
    Detached(Weak<ProviderInner>),
}

pub(crate) struct ProviderInner {
    pub(crate) registry: Registry,
    pub(crate) metadata: Box<dyn MetadataSource>,
    pub(crate) options: ContainerOptions,
    pub(crate) observers: Observers,
    /// Implicit top-level scope used by `ScopedFromRoot::RootScope`
    pub(crate) root_scope: ScopeStorage,
    pub(crate) root_disposers: Mutex<DisposeBag>,
    next_scope_id: AtomicU64,
}

impl ServiceProvider {
    pub(crate) fn new(
        registry: Registry,
        metadata: Box<dyn MetadataSource>,
        options: ContainerOptions,
        observers: Observers,
    ) -> Self {
        tracing::debug!(
            registrations = registry.len(),
            max_depth = options.max_depth,
            scoped_from_root = ?options.scoped_from_root,
            "service provider built"
        );
        Self {
            handle: Handle::Owned(Arc::new(ProviderInner {
                registry,
                metadata,
                options,
                observers,
                root_scope: ScopeStorage::default(),
                root_disposers: Mutex::new(DisposeBag::default()),
                next_scope_id: AtomicU64::new(1),
            })),
        }
    }

    /// Shared container state, upgrading a detached handle.
    pub(crate) fn inner(&self) -> DiResult<Cow<'_, Arc<ProviderInner>>> {
        match &self.handle {
            Handle::Owned(inner) => Ok(Cow::Borrowed(inner)),
            Handle::Detached(weak) => weak.upgrade().map(Cow::Owned).ok_or(DiError::ProviderDropped),
        }
    }

    fn detached(inner: &Arc<ProviderInner>) -> Self {
        Self {
            handle: Handle::Detached(Arc::downgrade(inner)),
        }
    }

    /// An owning handle when the container is still alive.
    fn attached(&self) -> Self {
        match self.inner() {
            Ok(inner) => Self {
                handle: Handle::Owned(inner.into_owned()),
            },
            Err(_) => self.clone(),
        }
    }

    fn as_ptr(&self) -> *const ProviderInner {
        match &self.handle {
            Handle::Owned(inner) => Arc::as_ptr(inner),
            Handle::Detached(weak) => weak.as_ptr(),
        }
    }

    /// Whether this handle keeps the container alive.
    pub fn is_detached(&self) -> bool {
        matches!(self.handle, Handle::Detached(_))
    }

    /// Creates a new scope for resolving scoped services.
    ///
    /// Each scope keeps its own cache of Scoped services while sharing the
    /// provider's singletons.
    ///
    /// # Examples
    ///
    /// ```
    /// use keel_di::{ServiceCollection, Resolver};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// struct RequestId(usize);
    ///
    /// let counter = Arc::new(AtomicUsize::new(0));
    /// let c = counter.clone();
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_scoped_factory::<RequestId, _>(move |_| {
    ///     Ok(RequestId(c.fetch_add(1, Ordering::SeqCst)))
    /// });
    /// let provider = collection.build();
    ///
    /// let scope1 = provider.create_scope();
    /// let scope2 = provider.create_scope();
    ///
    /// let req1a = scope1.get_required::<RequestId>();
    /// let req1b = scope1.get_required::<RequestId>();
    /// let req2 = scope2.get_required::<RequestId>();
    ///
    /// assert!(Arc::ptr_eq(&req1a, &req1b));
    /// assert!(!Arc::ptr_eq(&req1a, &req2));
    /// assert_eq!(counter.load(Ordering::SeqCst), 2);
    /// ```
    ///
    /// A scope owns its provider, so scopes created through a detached handle
    /// keep the container alive.
    pub fn create_scope(&self) -> Scope {
        let root = self.attached();
        let id = root
            .inner()
            .map(|inner| inner.next_scope_id.fetch_add(1, Ordering::Relaxed))
            .unwrap_or_default();
        tracing::debug!(scope = id, "scope created");
        Scope::new(root, id)
    }

    /// Runs the provider's disposal hooks in LIFO order.
    ///
    /// Hooks registered while building singletons (or transients resolved
    /// outside any scope) land here. Instances cached by the implicit root
    /// scope are released as well. Singletons stay cached.
    pub fn dispose_all(&self) {
        let Ok(inner) = self.inner() else {
            return;
        };
        let mut hooks = inner.root_disposers.lock().take();
        let count = hooks.len();
        hooks.run_all_reverse();
        inner.root_scope.clear();
        tracing::debug!(hooks = count, "provider disposal hooks ran");
    }

    /// True when both handles refer to the same container.
    pub fn same_provider(&self, other: &ServiceProvider) -> bool {
        std::ptr::eq(self.as_ptr(), other.as_ptr())
    }

    /// Options the provider was built with.
    pub fn options(&self) -> ContainerOptions {
        self.inner()
            .map(|inner| inner.options.clone())
            .unwrap_or_default()
    }

    /// Whether `key` has a registration (or names the provider itself).
    pub fn is_registered(&self, key: &Key) -> bool {
        is_provider_key(key) || self.inner().map_or(false, |inner| inner.registry.contains(key))
    }

    /// All descriptors in insertion order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.inner()
            .map(|inner| inner.registry.iter().map(|r| r.descriptor).collect())
            .unwrap_or_default()
    }

    /// Checks the registrations against the provider's metadata source.
    pub fn validate(&self) -> ValidationReport {
        self.inner()
            .map(|inner| crate::validation::validate(&inner.registry, inner.metadata.as_ref()))
            .unwrap_or_default()
    }

    /// Dependency graph as seen by this provider.
    pub fn dependency_graph(&self) -> DependencyGraph {
        self.inner()
            .map(|inner| DependencyGraph::build(&inner.registry, inner.metadata.as_ref()))
            .unwrap_or_default()
    }
}

impl Clone for ServiceProvider {
    fn clone(&self) -> Self {
        let handle = match &self.handle {
            Handle::Owned(inner) => Handle::Owned(inner.clone()),
            Handle::Detached(weak) => Handle::Detached(weak.clone()),
        };
        Self { handle }
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("ServiceProvider");
        out.field("detached", &self.is_detached());
        if let Ok(inner) = self.inner() {
            out.field("registrations", &inner.registry.len())
                .field("options", &inner.options);
        }
        out.finish()
    }
}

impl Drop for ServiceProvider {
    fn drop(&mut self) {
        let Handle::Owned(inner) = &self.handle else {
            return;
        };
        // Last owning handle to the container
        if Arc::strong_count(inner) == 1 {
            if let Some(bag) = inner.root_disposers.try_lock() {
                if !bag.is_empty() {
                    tracing::warn!(
                        hooks = bag.len(),
                        "ServiceProvider dropped with undisposed resources. Call dispose_all() before dropping."
                    );
                }
            }
        }
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        let inner = self.inner()?;
        Resolution::new(self, &inner, None).resolve(key)
    }

    /// Hooks pushed through a detached handle whose container is gone are
    /// dropped without running.
    fn push_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        if let Ok(inner) = self.inner() {
            inner.root_disposers.lock().push(f);
        }
    }
}

/// Identities that resolve to the provider itself.
pub(crate) fn is_provider_key(key: &Key) -> bool {
    *key == key_of_type::<ServiceProvider>() || *key == Key::token(PROVIDER_TOKEN)
}

/// One top-level resolution: the provider, the active scope (if any) and the
/// in-progress path shared by every nested step.
pub(crate) struct Resolution<'a> {
    provider: &'a ServiceProvider,
    inner: &'a Arc<ProviderInner>,
    scope: Option<&'a ScopeStorage>,
    path: RefCell<ResolutionPath>,
    /// Singleton builds currently on the path
    singleton_builds: Cell<usize>,
}

impl<'a> Resolution<'a> {
    pub(crate) fn new(
        provider: &'a ServiceProvider,
        inner: &'a Arc<ProviderInner>,
        scope: Option<&'a ScopeStorage>,
    ) -> Self {
        Self {
            provider,
            inner,
            scope,
            path: RefCell::new(ResolutionPath::new(inner.options.max_depth)),
            singleton_builds: Cell::new(0),
        }
    }

    pub(crate) fn provider(&self) -> &'a ServiceProvider {
        self.provider
    }

    pub(crate) fn resolve(&self, key: &Key) -> DiResult<AnyArc> {
        let observers = &self.inner.observers;
        if !observers.has_observers() {
            return self.resolve_registered(key);
        }

        let start = Instant::now();
        observers.resolving(key);
        let result = self.resolve_registered(key);
        match &result {
            Ok(_) => observers.resolved(key, start.elapsed()),
            Err(error) => observers.failed(key, error),
        }
        result
    }

    fn resolve_registered(&self, key: &Key) -> DiResult<AnyArc> {
        if is_provider_key(key) {
            return Ok(Arc::new(ServiceProvider::detached(self.inner)));
        }

        let registration = self
            .inner
            .registry
            .lookup(key)
            .ok_or(DiError::NotFound(key.display_name()))?;

        // Path guard before any slot lock so a cycle errors instead of deadlocking
        let _guard = PathGuard::enter(&self.path, *key)?;

        match registration.descriptor.lifetime {
            Lifetime::Singleton => self.resolve_singleton(registration),
            Lifetime::Scoped => self.resolve_scoped(registration),
            Lifetime::Transient => self.instantiate(registration),
        }
    }

    fn resolve_singleton(&self, registration: &Registration) -> DiResult<AnyArc> {
        let Some(slot) = &registration.singleton else {
            return self.instantiate(registration);
        };
        let mut cached = slot.lock();
        if let Some(value) = cached.as_ref() {
            return Ok(value.clone());
        }
        // Whatever gets built beneath a singleton lives as long as the provider
        self.singleton_builds.set(self.singleton_builds.get() + 1);
        let built = self.instantiate(registration);
        self.singleton_builds.set(self.singleton_builds.get() - 1);
        let value = built?;
        *cached = Some(value.clone());
        Ok(value)
    }

    fn resolve_scoped(&self, registration: &Registration) -> DiResult<AnyArc> {
        let service = registration.descriptor.service;
        let storage = self.scoped_storage(&service)?;
        if let Some(value) = storage.get(&service)? {
            return Ok(value);
        }
        // Build without holding the cache lock; first writer wins
        let value = self.instantiate(registration)?;
        storage.insert(service, value)
    }

    fn scoped_storage(&self, service: &Key) -> DiResult<&'a ScopeStorage> {
        match self.scope {
            Some(storage) => Ok(storage),
            None => match self.inner.options.scoped_from_root {
                ScopedFromRoot::RootScope => Ok(&self.inner.root_scope),
                ScopedFromRoot::Fail => Err(DiError::ScopedOutsideScope(service.display_name())),
            },
        }
    }

    fn instantiate(&self, registration: &Registration) -> DiResult<AnyArc> {
        let descriptor = &registration.descriptor;
        let instance = match &registration.activator {
            Activator::Instance(value) => value.clone(),
            Activator::Constructor(construct) => {
                let parameters = effective_parameters(
                    self.inner.metadata.as_ref(),
                    &descriptor.implementation,
                );
                let mut values = Vec::with_capacity(parameters.len());
                for parameter in &parameters {
                    values.push(self.resolve(parameter)?);
                }
                let mut args = Arguments::new(descriptor.implementation_name(), values);
                construct(&mut args)?
            }
            Activator::Factory(factory) => {
                let ctx = ResolverContext::new(self, descriptor.lifetime);
                factory(&ctx)?
            }
        };

        tracing::trace!(
            service = %descriptor.service,
            implementation = descriptor.implementation_name(),
            lifetime = %descriptor.lifetime,
            depth = self.path.borrow().depth(),
            "instantiated service"
        );
        Ok(instance)
    }

    /// Routes a disposal hook registered while building a `lifetime` service.
    ///
    /// Hooks from singleton builds, and from anything built while a singleton
    /// is under construction, belong to the provider.
    pub(crate) fn push_disposer(&self, lifetime: Lifetime, f: Disposer) {
        let owned_by_provider = lifetime == Lifetime::Singleton || self.singleton_builds.get() > 0;
        match self.scope {
            Some(scope) if !owned_by_provider => scope.push_disposer(f),
            _ => self.inner.root_disposers.lock().push(f),
        }
    }
}
