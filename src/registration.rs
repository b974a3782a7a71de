//! Service registration types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::metadata::{effective_parameters, Arguments, MetadataSource};
use crate::provider::ResolverContext;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

#[cfg(feature = "ahash")]
pub(crate) type KeyMap<V> = HashMap<Key, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type KeyMap<V> = HashMap<Key, V>;

pub(crate) type ConstructorFn = Arc<dyn Fn(&mut Arguments) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type FactoryFn =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// How a registration produces its instance.
pub(crate) enum Activator {
    /// Parameters come from the metadata source, resolved by the container
    Constructor(ConstructorFn),
    /// User factory resolving its own dependencies
    Factory(FactoryFn),
    /// Pre-built value
    Instance(AnyArc),
}

/// Service registration with lifetime and activator
pub(crate) struct Registration {
    pub(crate) descriptor: ServiceDescriptor,
    pub(crate) activator: Activator,
    /// Singleton slot, held across check-then-create
    pub(crate) singleton: Option<Mutex<Option<AnyArc>>>,
}

impl Registration {
    pub(crate) fn new(descriptor: ServiceDescriptor, activator: Activator) -> Self {
        let singleton = match descriptor.lifetime {
            Lifetime::Singleton => Some(Mutex::new(None)),
            _ => None,
        };
        Self {
            descriptor,
            activator,
            singleton,
        }
    }

    /// Identities this registration's constructor asks for, or `None` when the
    /// activator resolves its own dependencies (factories) or needs none.
    pub(crate) fn dependencies(&self, metadata: &dyn MetadataSource) -> Option<Vec<Key>> {
        match self.activator {
            Activator::Constructor(_) => {
                Some(effective_parameters(metadata, &self.descriptor.implementation))
            }
            Activator::Factory(_) | Activator::Instance(_) => None,
        }
    }
}

/// Ordered registry of registrations.
///
/// Every registration is kept in insertion order; the index points at the
/// first registration for each service identity, which is the one resolution
/// uses.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<Registration>,
    index: KeyMap<usize>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a registration. Returns true when it is the first for its service.
    pub(crate) fn register(&mut self, registration: Registration) -> bool {
        let position = self.entries.len();
        let service = registration.descriptor.service;
        self.entries.push(registration);
        match self.index.entry(service) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(position);
                true
            }
        }
    }

    /// First registration for `service`.
    #[inline]
    pub(crate) fn lookup(&self, service: &Key) -> Option<&Registration> {
        self.index.get(service).map(|&i| &self.entries[i])
    }

    #[inline]
    pub(crate) fn contains(&self, service: &Key) -> bool {
        self.index.contains_key(service)
    }

    /// All registrations in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    /// Registrations resolution actually uses, in insertion order.
    pub(crate) fn effective(&self) -> impl Iterator<Item = &Registration> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, r)| self.index.get(&r.descriptor.service) == Some(i))
            .map(|(_, r)| r)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

pub(crate) fn downcast_value<T: Send + Sync + 'static>(value: AnyArc) -> DiResult<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

// Trait objects are stored as Arc<Arc<dyn Trait>>
pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(value: AnyArc) -> DiResult<Arc<T>> {
    value
        .downcast::<Arc<T>>()
        .map(|outer| (*outer).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}
