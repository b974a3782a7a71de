//! Registration validation for dependency injection configurations.
//!
//! Validation walks the constructor graph the resolver would walk, using the
//! same metadata, without instantiating anything. Factory and instance
//! registrations contribute no edges since their dependencies are opaque.
//!
//! # Validation Rules
//!
//! - **Missing dependencies**: error
//! - **Dependency cycles**: error
//! - **Singleton → Scoped**: error, the singleton would capture one scope's instance
//! - **Singleton → Transient**: warning, the singleton keeps a single transient forever
//! - **Shadowed registrations**: warning, later registrations for an identity are never used

use std::collections::HashSet;
use std::fmt;

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::metadata::MetadataSource;
use crate::provider::is_provider_key;
use crate::registration::{KeyMap, Registry};

/// A validation error that makes resolution fail at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required dependency is not registered
    MissingDependency { service: Key, dependency: Key },
    /// Circular dependency detected; the first identity is repeated at the end
    CircularDependency { cycle: Vec<Key> },
    /// Singleton service depends on scoped service
    SingletonDependsOnScoped { singleton: Key, scoped: Key },
}

/// A validation warning about potentially problematic configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Singleton depends on transient (will always get same instance)
    SingletonDependsOnTransient { singleton: Key, transient: Key },
    /// A later registration for `service` that resolution never uses
    ShadowedRegistration {
        service: Key,
        implementation: &'static str,
        lifetime: Lifetime,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingDependency { service, dependency } => {
                write!(f, "Service '{}' depends on unregistered service '{}'", service, dependency)
            }
            ValidationError::CircularDependency { cycle } => {
                let names: Vec<_> = cycle.iter().map(Key::display_name).collect();
                write!(f, "Circular dependency detected: {}", names.join(" -> "))
            }
            ValidationError::SingletonDependsOnScoped { singleton, scoped } => write!(
                f,
                "Singleton service '{}' cannot depend on scoped service '{}'",
                singleton, scoped
            ),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::SingletonDependsOnTransient { singleton, transient } => write!(
                f,
                "Singleton '{}' depends on transient '{}' - will always get same instance",
                singleton, transient
            ),
            ValidationWarning::ShadowedRegistration {
                service,
                implementation,
                lifetime,
            } => write!(
                f,
                "{} registration of '{}' for '{}' is shadowed by an earlier registration",
                lifetime, implementation, service
            ),
        }
    }
}

/// Result of validating a set of registrations.
///
/// # Examples
///
/// ```
/// use keel_di::{ServiceCollection, ValidationError, key_of_type};
/// use keel_di::{Injectable, Arguments, ConstructorMetadata, DiResult};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct RequestContext;
/// keel_di::injectable_default!(RequestContext);
///
/// struct Cache { ctx: Arc<RequestContext> }
/// impl Injectable for Cache {
///     fn metadata() -> ConstructorMetadata {
///         ConstructorMetadata::new().param::<RequestContext>()
///     }
///     fn construct(args: &mut Arguments) -> DiResult<Self> {
///         Ok(Cache { ctx: args.next()? })
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped::<RequestContext>().add_singleton::<Cache>();
///
/// let report = services.validate();
/// assert!(!report.is_valid());
/// assert_eq!(
///     report.errors[0],
///     ValidationError::SingletonDependsOnScoped {
///         singleton: key_of_type::<Cache>(),
///         scoped: key_of_type::<RequestContext>(),
///     }
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Errors that make resolution fail
    pub errors: Vec<ValidationError>,
    /// Warnings about potentially problematic configurations
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// Returns true if validation passed without errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if there are warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Errors joined into one line each.
    pub fn format_errors(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Formats errors and warnings for display.
    pub fn format_issues(&self) -> String {
        let mut output = String::new();

        if !self.errors.is_empty() {
            output.push_str("Validation Errors:\n");
            for error in &self.errors {
                output.push_str(&format!("  - {}\n", error));
            }
        }

        if !self.warnings.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str("Validation Warnings:\n");
            for warning in &self.warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        output
    }
}

pub(crate) fn validate(registry: &Registry, metadata: &dyn MetadataSource) -> ValidationReport {
    let mut report = ValidationReport::default();

    // Lifetimes and edges of the registrations resolution actually uses
    let mut lifetimes: KeyMap<Lifetime> = KeyMap::default();
    let mut order: Vec<Key> = Vec::new();
    let mut edges: KeyMap<Vec<Key>> = KeyMap::default();
    for registration in registry.effective() {
        let service = registration.descriptor.service;
        lifetimes.insert(service, registration.descriptor.lifetime);
        order.push(service);
        if let Some(dependencies) = registration.dependencies(metadata) {
            edges.insert(service, dependencies);
        }
    }

    for service in &order {
        let lifetime = lifetimes[service];
        for dependency in edges.get(service).into_iter().flatten() {
            if is_provider_key(dependency) {
                continue;
            }
            match lifetimes.get(dependency) {
                None => report.errors.push(ValidationError::MissingDependency {
                    service: *service,
                    dependency: *dependency,
                }),
                Some(Lifetime::Scoped) if lifetime == Lifetime::Singleton => {
                    report.errors.push(ValidationError::SingletonDependsOnScoped {
                        singleton: *service,
                        scoped: *dependency,
                    })
                }
                Some(Lifetime::Transient) if lifetime == Lifetime::Singleton => {
                    report.warnings.push(ValidationWarning::SingletonDependsOnTransient {
                        singleton: *service,
                        transient: *dependency,
                    })
                }
                Some(_) => {}
            }
        }
    }

    let mut visited = HashSet::new();
    let mut path = Vec::new();
    for service in &order {
        dfs_cycles(*service, &edges, &mut visited, &mut path, &mut report.errors);
    }

    let mut seen = HashSet::new();
    for registration in registry.iter() {
        let descriptor = &registration.descriptor;
        if !seen.insert(descriptor.service) {
            report.warnings.push(ValidationWarning::ShadowedRegistration {
                service: descriptor.service,
                implementation: descriptor.implementation_name(),
                lifetime: descriptor.lifetime,
            });
        }
    }

    report
}

fn dfs_cycles(
    current: Key,
    edges: &KeyMap<Vec<Key>>,
    visited: &mut HashSet<Key>,
    path: &mut Vec<Key>,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(start) = path.iter().position(|k| *k == current) {
        let mut cycle = path[start..].to_vec();
        cycle.push(current);
        errors.push(ValidationError::CircularDependency { cycle });
        return;
    }

    if !visited.insert(current) {
        return;
    }

    path.push(current);
    for dependency in edges.get(&current).into_iter().flatten() {
        dfs_cycles(*dependency, edges, visited, path, errors);
    }
    path.pop();
}
