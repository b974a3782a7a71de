//! Service descriptors for registration and introspection.

use crate::key::Key;
use crate::lifetime::Lifetime;

/// Registration record binding a service identity to the implementation that
/// satisfies it and the lifetime governing reuse.
///
/// Several descriptors may exist for one service identity; resolution always
/// uses the first one registered.
///
/// # Examples
///
/// ```rust
/// use keel_di::{ServiceCollection, Lifetime, key_of_type};
///
/// #[derive(Default)]
/// struct Database;
/// keel_di::injectable_default!(Database);
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Database>();
/// services.add_transient::<Database>();
///
/// let descriptors = services.descriptors();
/// assert_eq!(descriptors.len(), 2);
/// assert_eq!(descriptors[0].lifetime, Lifetime::Singleton);
/// assert_eq!(descriptors[0].service, key_of_type::<Database>());
/// assert!(descriptors[0].is_self_bound());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// The identity the service is requested under
    pub service: Key,
    /// The identity of the concrete type that gets instantiated
    pub implementation: Key,
    /// Service lifetime
    pub lifetime: Lifetime,
}

impl ServiceDescriptor {
    /// Creates a descriptor; the implementation defaults to the service.
    pub fn new(service: Key, implementation: Option<Key>, lifetime: Lifetime) -> Self {
        Self {
            service,
            implementation: implementation.unwrap_or(service),
            lifetime,
        }
    }

    /// Get the service name for display
    pub fn service_name(&self) -> &'static str {
        self.service.display_name()
    }

    /// Get the implementation name for display
    pub fn implementation_name(&self) -> &'static str {
        self.implementation.display_name()
    }

    /// True when the service identity is also the implementation identity.
    pub fn is_self_bound(&self) -> bool {
        self.service == self.implementation
    }
}
