//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type and related functionality
//! for registering services and building service providers.

use std::sync::Arc;

use crate::config::ContainerOptions;
use crate::graph_export::DependencyGraph;
use crate::key::{key_of_trait, key_of_type, Key};
use crate::metadata::{ChainedMetadata, ConstructorMetadata, Injectable, MetadataSource, MetadataTable};
use crate::observer::Observers;
use crate::provider::ResolverContext;
use crate::registration::{Activator, AnyArc, Registration, Registry};
use crate::validation::ValidationReport;
use crate::{DiError, DiObserver, DiResult, Lifetime, ServiceDescriptor, ServiceProvider};

pub mod module_system;
pub use module_system::*;

/// Registration surface of the container.
///
/// Registrations are appended in order and never deduplicated; when an
/// identity is registered more than once, resolution uses the first
/// registration. Calling [`build`](Self::build) consumes the collection.
///
/// # Examples
///
/// ```rust
/// use keel_di::{ServiceCollection, Resolver, Injectable, Arguments, ConstructorMetadata, DiResult};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Config;
/// keel_di::injectable_default!(Config);
///
/// struct Repository { config: Arc<Config> }
/// impl Injectable for Repository {
///     fn metadata() -> ConstructorMetadata {
///         ConstructorMetadata::new().param::<Config>()
///     }
///     fn construct(args: &mut Arguments) -> DiResult<Self> {
///         Ok(Repository { config: args.next()? })
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Config>().add_scoped::<Repository>();
///
/// let provider = services.build();
/// let scope = provider.create_scope();
/// let repo = scope.get_required::<Repository>();
/// assert!(Arc::ptr_eq(&repo.config, &provider.get_required::<Config>()));
/// ```
pub struct ServiceCollection {
    registry: Registry,
    metadata: MetadataTable,
    options: ContainerOptions,
    observers: Observers,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            metadata: MetadataTable::new(),
            options: ContainerOptions::default(),
            observers: Observers::new(),
        }
    }

    // ----- General Registrations -----

    /// Registers `T` under `service`, built by the container from its metadata.
    ///
    /// ```rust
    /// use keel_di::{ServiceCollection, Resolver, Key, Lifetime};
    ///
    /// #[derive(Default)]
    /// struct Mailer;
    /// keel_di::injectable_default!(Mailer);
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add::<Mailer>(Key::token("mailer"), Lifetime::Singleton);
    /// let provider = services.build();
    /// assert!(provider.get_token::<Mailer>("mailer").is_ok());
    /// ```
    pub fn add<T: Injectable>(&mut self, service: Key, lifetime: Lifetime) -> &mut Self {
        self.record_metadata::<T>();
        let construct = |args: &mut crate::Arguments| -> DiResult<AnyArc> {
            Ok(Arc::new(T::construct(args)?) as AnyArc)
        };
        self.push(
            service,
            key_of_type::<T>(),
            lifetime,
            Activator::Constructor(Arc::new(construct)),
        );
        self
    }

    /// Registers `I` under `service`, stored through `upcast` as a trait object.
    ///
    /// Trait values are stored as `Arc<Arc<S>>` so they can be recovered with
    /// [`Resolver::get_trait`](crate::Resolver::get_trait).
    pub fn add_as<S, I, U>(&mut self, service: Key, lifetime: Lifetime, upcast: U) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
        U: Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    {
        self.record_metadata::<I>();
        let construct = move |args: &mut crate::Arguments| -> DiResult<AnyArc> {
            let concrete = Arc::new(I::construct(args)?);
            Ok(Arc::new(upcast(concrete)) as AnyArc)
        };
        self.push(
            service,
            key_of_type::<I>(),
            lifetime,
            Activator::Constructor(Arc::new(construct)),
        );
        self
    }

    /// Registers a factory for `T` under `service`.
    ///
    /// Factories resolve their own dependencies through the
    /// [`ResolverContext`]; they contribute no edges to validation.
    pub fn add_factory<T, F>(&mut self, service: Key, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        let factory = move |ctx: &ResolverContext| -> DiResult<AnyArc> {
            Ok(Arc::new(factory(ctx)?) as AnyArc)
        };
        self.push(
            service,
            key_of_type::<T>(),
            lifetime,
            Activator::Factory(Arc::new(factory)),
        );
        self
    }

    // ----- Concrete Type Registrations -----

    /// Registers `T` as a singleton, built on first request.
    pub fn add_singleton<T: Injectable>(&mut self) -> &mut Self {
        self.add::<T>(key_of_type::<T>(), Lifetime::Singleton)
    }

    /// Registers `T` as scoped: one instance per scope.
    pub fn add_scoped<T: Injectable>(&mut self) -> &mut Self {
        self.add::<T>(key_of_type::<T>(), Lifetime::Scoped)
    }

    /// Registers `T` as transient: a new instance per request.
    pub fn add_transient<T: Injectable>(&mut self) -> &mut Self {
        self.add::<T>(key_of_type::<T>(), Lifetime::Transient)
    }

    /// Registers a pre-built singleton value.
    ///
    /// ```rust
    /// # use keel_di::{ServiceCollection, Resolver};
    /// struct Config {
    ///     database_url: String
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_instance(Config {
    ///     database_url: "postgres://localhost".to_string()
    /// });
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Config>().database_url, "postgres://localhost");
    /// ```
    pub fn add_singleton_instance<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        let key = key_of_type::<T>();
        self.push(key, key, Lifetime::Singleton, Activator::Instance(Arc::new(value)));
        self
    }

    /// Registers a pre-built trait object as a singleton.
    pub fn add_instance_trait<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) -> &mut Self {
        let key = key_of_trait::<T>();
        self.push(key, key, Lifetime::Singleton, Activator::Instance(Arc::new(value)));
        self
    }

    // ----- Trait Registrations -----

    /// Registers `I` as the singleton implementation of trait `S`.
    ///
    /// ```rust
    /// use keel_di::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Clock: Send + Sync { fn now(&self) -> u64; }
    ///
    /// #[derive(Default)]
    /// struct FixedClock;
    /// impl Clock for FixedClock { fn now(&self) -> u64 { 42 } }
    /// keel_di::injectable_default!(FixedClock);
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait::<dyn Clock, FixedClock, _>(|c| c);
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required_trait::<dyn Clock>().now(), 42);
    /// ```
    pub fn add_singleton_trait<S, I, U>(&mut self, upcast: U) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
        U: Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    {
        self.add_as::<S, I, U>(key_of_trait::<S>(), Lifetime::Singleton, upcast)
    }

    /// Registers `I` as the scoped implementation of trait `S`.
    pub fn add_scoped_trait<S, I, U>(&mut self, upcast: U) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
        U: Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    {
        self.add_as::<S, I, U>(key_of_trait::<S>(), Lifetime::Scoped, upcast)
    }

    /// Registers `I` as the transient implementation of trait `S`.
    pub fn add_transient_trait<S, I, U>(&mut self, upcast: U) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
        U: Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    {
        self.add_as::<S, I, U>(key_of_trait::<S>(), Lifetime::Transient, upcast)
    }

    // ----- Token Registrations -----

    /// Registers `I` as a singleton under a string token.
    pub fn add_singleton_token<I: Injectable>(&mut self, token: &'static str) -> &mut Self {
        self.add::<I>(Key::token(token), Lifetime::Singleton)
    }

    /// Registers `I` as scoped under a string token.
    pub fn add_scoped_token<I: Injectable>(&mut self, token: &'static str) -> &mut Self {
        self.add::<I>(Key::token(token), Lifetime::Scoped)
    }

    /// Registers `I` as transient under a string token.
    pub fn add_transient_token<I: Injectable>(&mut self, token: &'static str) -> &mut Self {
        self.add::<I>(Key::token(token), Lifetime::Transient)
    }

    // ----- Factory Registrations -----

    /// Registers a singleton factory.
    ///
    /// ```rust
    /// use keel_di::{ServiceCollection, Resolver};
    ///
    /// struct Pool { size: usize }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_instance(8usize);
    /// services.add_singleton_factory::<Pool, _>(|ctx| {
    ///     Ok(Pool { size: *ctx.get::<usize>()? })
    /// });
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Pool>().size, 8);
    /// ```
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_factory::<T, F>(key_of_type::<T>(), Lifetime::Singleton, factory)
    }

    /// Registers a scoped factory.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_factory::<T, F>(key_of_type::<T>(), Lifetime::Scoped, factory)
    }

    /// Registers a transient factory.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_factory::<T, F>(key_of_type::<T>(), Lifetime::Transient, factory)
    }

    // ----- Conditional Registration (TryAdd*) -----

    /// Registers `T` as a singleton unless `T` already has a registration.
    ///
    /// Returns true when the registration was added.
    ///
    /// ```rust
    /// use keel_di::ServiceCollection;
    ///
    /// #[derive(Default)]
    /// struct Cache;
    /// keel_di::injectable_default!(Cache);
    ///
    /// let mut services = ServiceCollection::new();
    /// assert!(services.try_add_singleton::<Cache>());
    /// assert!(!services.try_add_transient::<Cache>());
    /// assert_eq!(services.len(), 1);
    /// ```
    pub fn try_add_singleton<T: Injectable>(&mut self) -> bool {
        self.try_add::<T>(Lifetime::Singleton)
    }

    /// Registers `T` as scoped unless `T` already has a registration.
    pub fn try_add_scoped<T: Injectable>(&mut self) -> bool {
        self.try_add::<T>(Lifetime::Scoped)
    }

    /// Registers `T` as transient unless `T` already has a registration.
    pub fn try_add_transient<T: Injectable>(&mut self) -> bool {
        self.try_add::<T>(Lifetime::Transient)
    }

    fn try_add<T: Injectable>(&mut self, lifetime: Lifetime) -> bool {
        let key = key_of_type::<T>();
        if self.registry.contains(&key) {
            return false;
        }
        self.add::<T>(key, lifetime);
        true
    }

    // ----- Metadata -----

    /// Records constructor metadata for `implementation`, replacing whatever
    /// was recorded before (including `Injectable::metadata`).
    ///
    /// ```rust
    /// use keel_di::{ServiceCollection, Resolver, ConstructorMetadata, Key, key_of_type};
    /// use keel_di::{Injectable, Arguments, DiResult};
    /// use std::sync::Arc;
    ///
    /// struct Port(u16);
    /// struct Server { port: Arc<Port> }
    /// impl Injectable for Server {
    ///     fn construct(args: &mut Arguments) -> DiResult<Self> {
    ///         Ok(Server { port: args.next()? })
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services
    ///     .add_singleton_factory::<Port, _>(|_| Ok(Port(8080)))
    ///     .add_transient::<Server>()
    ///     .describe(key_of_type::<Server>(), ConstructorMetadata::new().param::<Port>());
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Server>().port.0, 8080);
    /// ```
    pub fn describe(&mut self, implementation: Key, metadata: ConstructorMetadata) -> &mut Self {
        self.metadata.insert(implementation, metadata);
        self
    }

    /// Metadata recorded for `implementation`, if any.
    pub fn metadata_for(&self, implementation: &Key) -> Option<&ConstructorMetadata> {
        self.metadata.get(implementation)
    }

    fn record_metadata<T: Injectable>(&mut self) {
        self.metadata.insert_if_absent(key_of_type::<T>(), T::metadata());
    }

    // ----- Configuration -----

    /// Sets the options the built provider uses.
    pub fn with_options(&mut self, options: ContainerOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    /// Adds a diagnostic observer for resolution events.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    // ----- Introspection -----

    /// All descriptors in insertion order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry.iter().map(|r| r.descriptor).collect()
    }

    /// Whether `service` has at least one registration.
    pub fn contains(&self, service: &Key) -> bool {
        self.registry.contains(service)
    }

    /// Number of registrations, duplicates included.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Checks the registered graph without building anything.
    pub fn validate(&self) -> ValidationReport {
        crate::validation::validate(&self.registry, &self.metadata)
    }

    /// Dependency graph of the current registrations.
    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::build(&self.registry, &self.metadata)
    }

    // ----- Build -----

    /// Builds the provider using the metadata recorded at registration.
    pub fn build(self) -> ServiceProvider {
        let Self {
            registry,
            metadata,
            options,
            observers,
        } = self;
        ServiceProvider::new(registry, Box::new(metadata), options, observers)
    }

    /// Builds the provider with a caller-supplied metadata source.
    ///
    /// `source` is consulted first; implementations it does not know fall
    /// back to the metadata recorded at registration.
    pub fn build_with_metadata(self, source: Arc<dyn MetadataSource>) -> ServiceProvider {
        let Self {
            registry,
            metadata,
            options,
            observers,
        } = self;
        let chained = ChainedMetadata {
            primary: source,
            fallback: metadata,
        };
        ServiceProvider::new(registry, Box::new(chained), options, observers)
    }

    /// Validates options and registrations, then builds.
    ///
    /// Validation errors fail the build; warnings are logged.
    pub fn try_build(self) -> DiResult<ServiceProvider> {
        self.options.validate()?;
        let report = self.validate();
        for warning in &report.warnings {
            tracing::warn!(%warning, "service registration warning");
        }
        if !report.is_valid() {
            return Err(DiError::Validation(report.format_errors()));
        }
        Ok(self.build())
    }

    fn push(&mut self, service: Key, implementation: Key, lifetime: Lifetime, activator: Activator) {
        let descriptor = ServiceDescriptor::new(service, Some(implementation), lifetime);
        let effective = self.registry.register(Registration::new(descriptor, activator));
        if !effective {
            tracing::debug!(
                service = %service,
                implementation = implementation.display_name(),
                "registration shadowed by an earlier one for the same service"
            );
        }
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("registrations", &self.registry.len())
            .field("described", &self.metadata.len())
            .field("observers", &self.observers.len())
            .field("options", &self.options)
            .finish()
    }
}
