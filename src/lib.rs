//! # keel-di
//!
//! Metadata-driven dependency injection with singleton, scoped and transient lifetimes.
//!
//! ## Features
//!
//! - **Explicit metadata**: constructor parameters are declared, never reflected
//! - **Typed identities**: services are keyed by type, trait object or string token
//! - **Scoped isolation**: per-scope caches with disposal hooks run in reverse order
//! - **Circular dependency detection**: cycles are reported with the full path
//! - **Validation**: missing dependencies, cycles and captive scoped services are found before resolution
//!
//! ## Quick Start
//!
//! ```rust
//! use keel_di::{ServiceCollection, Resolver, Injectable, Arguments, ConstructorMetadata, DiResult};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! impl Injectable for Database {
//!     fn construct(_: &mut Arguments) -> DiResult<Self> {
//!         Ok(Database { connection_string: "postgres://localhost".to_string() })
//!     }
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     fn metadata() -> ConstructorMetadata {
//!         ConstructorMetadata::new().param::<Database>()
//!     }
//!     fn construct(args: &mut Arguments) -> DiResult<Self> {
//!         Ok(UserService { db: args.next()? })
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton::<Database>();
//! services.add_transient::<UserService>();
//!
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created once per provider and shared by every scope
//! - **Scoped**: Created once per scope (ideal for web request contexts)
//! - **Transient**: Created fresh on every resolution
//!
//! Resolving a scoped service from the root provider fails with
//! [`DiError::ScopedOutsideScope`] unless [`ScopedFromRoot::RootScope`] is
//! configured, in which case the provider acts as an implicit top-level scope.
//!
//! ## Scoped Services
//!
//! ```rust
//! use keel_di::{ServiceCollection, Resolver, DiError};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct RequestId(String);
//!
//! let counter = Arc::new(AtomicUsize::new(0));
//! let counter_clone = counter.clone();
//!
//! let mut services = ServiceCollection::new();
//! services.add_scoped_factory::<RequestId, _>(move |_| {
//!     let n = counter_clone.fetch_add(1, Ordering::SeqCst) + 1;
//!     Ok(RequestId(format!("req-{}", n)))
//! });
//!
//! let provider = services.build();
//! let scope1 = provider.create_scope();
//! let scope2 = provider.create_scope();
//!
//! let req1 = scope1.get_required::<RequestId>();
//! let req2 = scope2.get_required::<RequestId>();
//! assert_ne!(req1.0, req2.0);
//!
//! scope1.dispose();
//! assert!(matches!(scope1.get::<RequestId>(), Err(DiError::ScopeDisposed)));
//! ```

// Module declarations
pub mod collection;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod graph_export;
pub mod key;
pub mod lifetime;
pub mod metadata;
pub mod observer;
pub mod provider;
pub mod traits;
pub mod validation;

// Internal modules
mod internal;
mod registration;

pub use collection::{ServiceCollection, ServiceCollectionExt, ServiceCollectionModuleExt, ServiceModule};
pub use config::{ContainerOptions, ScopedFromRoot, DEFAULT_MAX_DEPTH};
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use graph_export::{ActivationKind, DependencyGraph, DependencyType, GraphEdge, GraphMetadata, GraphNode};
pub use key::{key_of_trait, key_of_type, Key};
pub use lifetime::Lifetime;
pub use metadata::{
    effective_parameters, Arguments, ConstructorMetadata, Injectable, InjectionOverride, MetadataSource,
    MetadataTable,
};
pub use observer::{DiObserver, LoggingObserver};
pub use provider::{ResolverContext, Scope, ServiceProvider, PROVIDER_TOKEN};
pub use traits::{Dispose, Resolver, ResolverCore};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};
