//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::{key_of_trait, key_of_type, Key};
use crate::registration::{downcast_trait, downcast_value};
use crate::traits::Dispose;

/// Core resolver trait for object-safe service resolution.
///
/// Implemented by [`ServiceProvider`](crate::ServiceProvider) (root context),
/// [`Scope`](crate::Scope) and the [`ResolverContext`](crate::ResolverContext)
/// handed to factories. Most users should use [`Resolver`] instead, which
/// layers typed methods on top.
pub trait ResolverCore {
    /// Resolves the service registered under `key`.
    ///
    /// Values registered for concrete types come back as `Arc<T>`; trait
    /// registrations come back as `Arc<Arc<dyn Trait>>`.
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Registers a synchronous disposal hook with the owning context.
    fn push_disposer(&self, f: Box<dyn FnOnce() + Send>);
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// # Examples
///
/// ```
/// use keel_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// #[derive(Default)]
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
/// keel_di::injectable_default!(ConsoleLogger);
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton_instance(42usize);
/// collection.add_singleton_trait::<dyn Logger, ConsoleLogger, _>(|l| l);
/// collection.add_singleton_token::<ConsoleLogger>("logger.console");
///
/// let provider = collection.build();
///
/// let number = provider.get_required::<usize>();
/// assert_eq!(*number, 42);
///
/// let logger = provider.get_required_trait::<dyn Logger>();
/// assert_eq!(logger.log("hi"), "LOG: hi");
///
/// let by_token = provider.get_token::<ConsoleLogger>("logger.console").unwrap();
/// assert_eq!(by_token.log("x"), "LOG: x");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    fn get<T: 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        downcast_value(self.resolve_any(&key_of_type::<T>())?)
    }

    /// Resolves a trait object registered under `key_of_trait::<T>()`.
    fn get_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        downcast_trait(self.resolve_any(&key_of_trait::<T>())?)
    }

    /// Resolves a concrete value registered under a string token.
    fn get_token<T: 'static + Send + Sync>(&self, token: &'static str) -> DiResult<Arc<T>> {
        downcast_value(self.resolve_any(&Key::token(token))?)
    }

    /// Resolves a trait object registered under a string token.
    fn get_token_trait<T: ?Sized + 'static + Send + Sync>(
        &self,
        token: &'static str,
    ) -> DiResult<Arc<T>> {
        downcast_trait(self.resolve_any(&Key::token(token))?)
    }

    /// Resolves a concrete service type, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved (not found, scope disposed,
    /// circular dependency, etc.).
    fn get_required<T: 'static + Send + Sync>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a trait implementation, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the trait cannot be resolved.
    fn get_required_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Arc<T> {
        self.get_trait::<T>().unwrap_or_else(|e| {
            panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e)
        })
    }

    /// Registers a service for disposal when its owning context is torn down.
    fn register_disposer<T: Dispose>(&self, service: Arc<T>) {
        self.push_disposer(Box::new(move || service.dispose()));
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
