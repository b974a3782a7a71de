//! Service module system for modular registration.
//!
//! This module provides traits and functionality for organizing service
//! registrations into reusable modules.

use crate::{DiResult, ServiceCollection};

/// A module that can register services with a ServiceCollection.
///
/// # Example
///
/// ```rust
/// use keel_di::{ServiceCollection, ServiceModule, ServiceCollectionExt, DiResult, Resolver};
/// use keel_di::{Injectable, Arguments, ConstructorMetadata};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct UserConfig;
/// keel_di::injectable_default!(UserConfig);
///
/// struct UserService { config: Arc<UserConfig> }
/// impl Injectable for UserService {
///     fn metadata() -> ConstructorMetadata {
///         ConstructorMetadata::new().param::<UserConfig>()
///     }
///     fn construct(args: &mut Arguments) -> DiResult<Self> {
///         Ok(UserService { config: args.next()? })
///     }
/// }
///
/// struct UserModule;
///
/// impl ServiceModule for UserModule {
///     fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
///         services.add_singleton::<UserConfig>().add_scoped::<UserService>();
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let provider = ServiceCollection::new().add_module(UserModule)?.build();
/// let scope = provider.create_scope();
/// assert!(scope.get::<UserService>().is_ok());
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Register this module's services with the ServiceCollection.
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()>;
}

/// Modules are often plain functions.
impl<F> ServiceModule for F
where
    F: FnOnce(&mut ServiceCollection) -> DiResult<()>,
{
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
        self(services)
    }
}

/// Extension trait for ServiceCollection that provides module registration capabilities.
pub trait ServiceCollectionExt {
    /// Add a module to the service collection using builder syntax.
    ///
    /// # Example
    ///
    /// ```rust
    /// use keel_di::{ServiceCollection, ServiceCollectionExt, ServiceModule, DiResult};
    ///
    /// struct DatabaseModule;
    /// impl ServiceModule for DatabaseModule {
    ///     fn register_services(self, _: &mut ServiceCollection) -> DiResult<()> { Ok(()) }
    /// }
    ///
    /// # fn main() -> DiResult<()> {
    /// let provider = ServiceCollection::new()
    ///     .add_module(DatabaseModule)?
    ///     .add_module(|services: &mut ServiceCollection| -> DiResult<()> {
    ///         services.add_singleton_instance(3u8);
    ///         Ok(())
    ///     })?
    ///     .build();
    /// # Ok(())
    /// # }
    /// ```
    fn add_module<M: ServiceModule>(self, module: M) -> DiResult<Self>
    where
        Self: Sized;
}

impl ServiceCollectionExt for ServiceCollection {
    fn add_module<M: ServiceModule>(mut self, module: M) -> DiResult<Self> {
        module.register_services(&mut self)?;
        Ok(self)
    }
}

/// In-place module registration matching the `&mut Self` registration API.
pub trait ServiceCollectionModuleExt {
    /// Add a module to the service collection in-place.
    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self>;
}

impl ServiceCollectionModuleExt for ServiceCollection {
    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_services(self)?;
        Ok(self)
    }
}
