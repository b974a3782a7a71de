//! Scoped service resolution.

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::internal::{DisposeBag, Disposer};
use crate::key::Key;
use crate::registration::{AnyArc, KeyMap};
use crate::traits::ResolverCore;

use super::{Resolution, ServiceProvider};

/// Cache of scoped instances plus the scope's disposal hooks.
///
/// Also backs the provider's implicit root scope.
#[derive(Default)]
pub(crate) struct ScopeStorage {
    state: Mutex<ScopedInstances>,
    disposers: Mutex<DisposeBag>,
}

#[derive(Default)]
struct ScopedInstances {
    disposed: bool,
    instances: KeyMap<AnyArc>,
}

impl ScopeStorage {
    pub(crate) fn ensure_live(&self) -> DiResult<()> {
        if self.state.lock().disposed {
            return Err(DiError::ScopeDisposed);
        }
        Ok(())
    }

    pub(crate) fn get(&self, key: &Key) -> DiResult<Option<AnyArc>> {
        let state = self.state.lock();
        if state.disposed {
            return Err(DiError::ScopeDisposed);
        }
        Ok(state.instances.get(key).cloned())
    }

    /// Stores `value` unless another caller got there first; returns the winner.
    pub(crate) fn insert(&self, key: Key, value: AnyArc) -> DiResult<AnyArc> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(DiError::ScopeDisposed);
        }
        Ok(state.instances.entry(key).or_insert(value).clone())
    }

    pub(crate) fn push_disposer(&self, f: Disposer) {
        self.disposers.lock().push(f);
    }

    /// Marks the storage inert, releases the cache and runs hooks LIFO.
    /// Returns false when it was already disposed.
    pub(crate) fn dispose(&self) -> bool {
        let released = {
            let mut state = self.state.lock();
            if state.disposed {
                return false;
            }
            state.disposed = true;
            std::mem::take(&mut state.instances)
        };
        // Hooks and instance drops run without holding any lock
        let mut hooks = self.disposers.lock().take();
        hooks.run_all_reverse();
        drop(released);
        true
    }

    /// Drops cached instances without marking the storage disposed.
    pub(crate) fn clear(&self) {
        let released = std::mem::take(&mut self.state.lock().instances);
        drop(released);
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    pub(crate) fn cached(&self) -> usize {
        self.state.lock().instances.len()
    }

    pub(crate) fn pending_disposers(&self) -> usize {
        self.disposers.lock().len()
    }
}

/// Scoped service resolver for request-scoped dependencies.
///
/// A scope caches Scoped services for its own lifetime and delegates
/// Singleton resolution to the root provider. Scopes are thread-safe; a
/// request handler may share one across tasks.
///
/// # Examples
///
/// ```
/// use keel_di::{ServiceCollection, Resolver, DiError};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct RequestContext;
/// keel_di::injectable_default!(RequestContext);
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped::<RequestContext>();
/// let provider = services.build();
///
/// let scope = provider.create_scope();
/// let a = scope.get_required::<RequestContext>();
/// let b = scope.get_required::<RequestContext>();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// scope.dispose();
/// assert!(scope.is_disposed());
/// assert!(matches!(scope.get::<RequestContext>(), Err(DiError::ScopeDisposed)));
/// ```
pub struct Scope {
    pub(crate) root: ServiceProvider,
    pub(crate) storage: ScopeStorage,
    id: u64,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider, id: u64) -> Self {
        Self {
            root,
            storage: ScopeStorage::default(),
            id,
        }
    }

    /// Identifier unique among the scopes of one provider.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The provider this scope was created from.
    pub fn provider(&self) -> &ServiceProvider {
        &self.root
    }

    /// Ends the scope.
    ///
    /// Every cached Scoped instance is released and the scope's disposal
    /// hooks run in reverse registration order. Later resolutions fail with
    /// [`DiError::ScopeDisposed`]. Calling it again does nothing.
    pub fn dispose(&self) {
        let hooks = self.storage.pending_disposers();
        let released = self.storage.cached();
        if self.storage.dispose() {
            tracing::debug!(scope = self.id, released, hooks, "scope disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.storage.is_disposed()
    }

    /// Number of Scoped instances currently cached by this scope.
    pub fn cached_instances(&self) -> usize {
        self.storage.cached()
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.storage.ensure_live()?;
        let inner = self.root.inner()?;
        Resolution::new(&self.root, &inner, Some(&self.storage)).resolve(key)
    }

    fn push_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.storage.push_disposer(f);
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !self.storage.is_disposed() && self.storage.pending_disposers() > 0 {
            tracing::warn!(
                scope = self.id,
                hooks = self.storage.pending_disposers(),
                "Scope dropped with undisposed resources. Call dispose() before dropping."
            );
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .field("cached", &self.cached_instances())
            .finish()
    }
}
