//! Constructor metadata: the explicit source of parameter identities.
//!
//! The container never guesses what a constructor needs. For every
//! implementation identity it asks a [`MetadataSource`] for the ordered list of
//! parameter identities and for any [`InjectionOverride`]s, resolves them in
//! order, and hands the results to the constructor as [`Arguments`].
//!
//! Types describe themselves by implementing [`Injectable`]; anything else can
//! be described with [`ServiceCollection::describe`](crate::ServiceCollection::describe)
//! or by supplying a custom source to
//! [`ServiceCollection::build_with_metadata`](crate::ServiceCollection::build_with_metadata).

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of_trait, key_of_type, Key};
use crate::registration::{downcast_trait, downcast_value, AnyArc, KeyMap};

/// Replaces the identity resolved for one constructor parameter.
///
/// Used when the declared parameter identity is not itself registrable, e.g.
/// a trait parameter that should be satisfied by a specific string token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionOverride {
    /// Zero-based constructor parameter position
    pub parameter_index: usize,
    /// Identity resolved instead of the declared one
    pub identity: Key,
}

impl InjectionOverride {
    pub fn new(parameter_index: usize, identity: Key) -> Self {
        Self {
            parameter_index,
            identity,
        }
    }
}

/// Ordered constructor parameters plus sparse injection overrides.
///
/// # Examples
///
/// ```rust
/// use keel_di::{ConstructorMetadata, Key, key_of_type};
///
/// struct Logger;
/// trait Clock {}
///
/// let meta = ConstructorMetadata::new()
///     .param::<Logger>()
///     .param_trait::<dyn Clock>()
///     .inject(1, Key::token("clock.utc"));
///
/// assert_eq!(meta.parameters.len(), 2);
/// assert_eq!(
///     meta.resolved_parameters(),
///     vec![key_of_type::<Logger>(), Key::token("clock.utc")]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructorMetadata {
    pub parameters: Vec<Key>,
    pub injections: Vec<InjectionOverride>,
}

impl ConstructorMetadata {
    /// Metadata for a constructor without parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a concrete-type parameter.
    pub fn param<T: 'static>(self) -> Self {
        self.param_key(key_of_type::<T>())
    }

    /// Appends a trait-object parameter.
    pub fn param_trait<T: ?Sized + 'static>(self) -> Self {
        self.param_key(key_of_trait::<T>())
    }

    /// Appends a parameter with an arbitrary identity.
    pub fn param_key(mut self, key: Key) -> Self {
        self.parameters.push(key);
        self
    }

    /// Resolves `identity` for the parameter at `parameter_index`.
    pub fn inject(mut self, parameter_index: usize, identity: Key) -> Self {
        self.injections
            .push(InjectionOverride::new(parameter_index, identity));
        self
    }

    /// Parameter identities with overrides applied.
    pub fn resolved_parameters(&self) -> Vec<Key> {
        apply_overrides(&self.parameters, &self.injections)
    }
}

/// Authoritative supplier of constructor metadata.
///
/// `parameters` returning `None` means the implementation is unknown to the
/// source and is treated as having no constructor parameters.
pub trait MetadataSource: Send + Sync {
    /// Ordered constructor parameter identities of `implementation`.
    fn parameters(&self, implementation: &Key) -> Option<Vec<Key>>;

    /// Injection overrides for `implementation`.
    fn injections(&self, implementation: &Key) -> Vec<InjectionOverride> {
        let _ = implementation;
        Vec::new()
    }
}

/// Parameter identities to resolve for `implementation`, in order.
///
/// The first override for an index wins; overrides past the end of the
/// parameter list are ignored.
pub fn effective_parameters(source: &dyn MetadataSource, implementation: &Key) -> Vec<Key> {
    let parameters = source.parameters(implementation).unwrap_or_default();
    if parameters.is_empty() {
        return parameters;
    }
    let injections = source.injections(implementation);
    apply_overrides(&parameters, &injections)
}

fn apply_overrides(parameters: &[Key], injections: &[InjectionOverride]) -> Vec<Key> {
    parameters
        .iter()
        .enumerate()
        .map(|(index, declared)| {
            injections
                .iter()
                .find(|o| o.parameter_index == index)
                .map(|o| o.identity)
                .unwrap_or(*declared)
        })
        .collect()
}

/// Default in-memory metadata source keyed by implementation identity.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    entries: KeyMap<ConstructorMetadata>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores metadata for `implementation`, replacing any previous entry.
    pub fn insert(&mut self, implementation: Key, metadata: ConstructorMetadata) {
        self.entries.insert(implementation, metadata);
    }

    /// Stores metadata only when none is recorded yet.
    pub(crate) fn insert_if_absent(&mut self, implementation: Key, metadata: ConstructorMetadata) {
        self.entries.entry(implementation).or_insert(metadata);
    }

    pub fn get(&self, implementation: &Key) -> Option<&ConstructorMetadata> {
        self.entries.get(implementation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataSource for MetadataTable {
    fn parameters(&self, implementation: &Key) -> Option<Vec<Key>> {
        self.entries.get(implementation).map(|m| m.parameters.clone())
    }

    fn injections(&self, implementation: &Key) -> Vec<InjectionOverride> {
        self.entries
            .get(implementation)
            .map(|m| m.injections.clone())
            .unwrap_or_default()
    }
}

/// Caller-supplied source consulted first, registration table as fallback.
pub(crate) struct ChainedMetadata {
    pub(crate) primary: Arc<dyn MetadataSource>,
    pub(crate) fallback: MetadataTable,
}

impl MetadataSource for ChainedMetadata {
    fn parameters(&self, implementation: &Key) -> Option<Vec<Key>> {
        self.primary
            .parameters(implementation)
            .or_else(|| self.fallback.parameters(implementation))
    }

    fn injections(&self, implementation: &Key) -> Vec<InjectionOverride> {
        if self.primary.parameters(implementation).is_some() {
            self.primary.injections(implementation)
        } else {
            self.fallback.injections(implementation)
        }
    }
}

/// A type the container can construct from resolved parameters.
///
/// `metadata` declares the parameter identities in constructor order;
/// `construct` consumes the resolved values in that same order.
///
/// # Examples
///
/// ```rust
/// use keel_di::{Injectable, Arguments, ConstructorMetadata, DiResult};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// impl Injectable for Config {
///     fn construct(_: &mut Arguments) -> DiResult<Self> {
///         Ok(Config { url: "postgres://localhost".into() })
///     }
/// }
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
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Constructor parameter identities and overrides. Defaults to none.
    fn metadata() -> ConstructorMetadata {
        ConstructorMetadata::new()
    }

    /// Builds the instance from resolved parameters.
    fn construct(args: &mut Arguments) -> DiResult<Self>;
}

/// Implements [`Injectable`] for parameterless types via `Default`.
#[macro_export]
macro_rules! injectable_default {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Injectable for $ty {
                fn construct(_: &mut $crate::Arguments) -> $crate::DiResult<Self> {
                    Ok(<$ty as ::std::default::Default>::default())
                }
            }
        )+
    };
}

/// Resolved constructor parameters, consumed in declaration order.
pub struct Arguments {
    implementation: &'static str,
    values: Vec<AnyArc>,
    cursor: usize,
}

impl Arguments {
    pub(crate) fn new(implementation: &'static str, values: Vec<AnyArc>) -> Self {
        Self {
            implementation,
            values,
            cursor: 0,
        }
    }

    /// Takes the next parameter as a concrete type.
    pub fn next<T: Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        downcast_value(self.next_any()?)
    }

    /// Takes the next parameter as a trait object.
    pub fn next_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        downcast_trait(self.next_any()?)
    }

    /// Takes the next parameter without downcasting.
    pub fn next_any(&mut self) -> DiResult<Arc<dyn Any + Send + Sync>> {
        let value = self
            .values
            .get(self.cursor)
            .cloned()
            .ok_or(DiError::MissingArgument {
                implementation: self.implementation,
                index: self.cursor,
            })?;
        self.cursor += 1;
        Ok(value)
    }

    /// Number of parameters not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.cursor)
    }

    /// Total number of resolved parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
