//! Disposal trait for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this trait for services that need structured teardown (flushing
/// buffers, closing connections). Hooks registered from a scoped or transient
/// build run when the owning scope is disposed; hooks registered while
/// building a singleton run on [`ServiceProvider::dispose_all`](crate::ServiceProvider::dispose_all).
/// Either way they run last-registered first.
///
/// # Examples
///
/// ```
/// use keel_di::{Dispose, ServiceCollection, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// struct Connection {
///     closed: Arc<AtomicBool>,
/// }
///
/// impl Dispose for Connection {
///     fn dispose(&self) {
///         self.closed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let closed = Arc::new(AtomicBool::new(false));
/// let flag = closed.clone();
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped_factory::<Connection, _>(move |ctx| {
///     ctx.register_disposer(Arc::new(Connection { closed: flag.clone() }));
///     Ok(Connection { closed: flag.clone() })
/// });
///
/// let provider = services.build();
/// let scope = provider.create_scope();
/// let _conn = scope.get_required::<Connection>();
/// assert!(!closed.load(Ordering::SeqCst));
///
/// scope.dispose();
/// assert!(closed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
