//! Error types for the dependency injection container.

use thiserror::Error;

/// Dependency injection errors
///
/// Every failure is surfaced to whoever started the resolution; the container
/// never retries.
///
/// # Examples
///
/// ```rust
/// use keel_di::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
///
/// let circular = DiError::Circular(vec!["A", "B", "A"]);
/// assert_eq!(circular.to_string(), "Circular dependency: A -> B -> A");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// No descriptor is registered for the requested identity
    #[error("Service not registered: {0}")]
    NotFound(&'static str),
    /// Resolution attempted through a disposed scope
    #[error("Scope has been disposed")]
    ScopeDisposed,
    /// An identity reappeared on the active resolution path (path ends with the repeat)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Resolution through a detached provider handle whose container is gone
    #[error("Service provider has been dropped")]
    ProviderDropped,
    /// Scoped service requested from the root provider with no scope context
    #[error("Scoped service {0} cannot be resolved outside of a scope")]
    ScopedOutsideScope(&'static str),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Maximum recursion depth exceeded
    #[error("Max resolution depth {0} exceeded")]
    DepthExceeded(usize),
    /// A constructor asked for more arguments than the metadata declared
    #[error("Constructor of {implementation} requested argument #{index} which its metadata does not declare")]
    MissingArgument {
        implementation: &'static str,
        index: usize,
    },
    /// A user factory or constructor reported a failure
    #[error("Factory for {service} failed: {message}")]
    Factory {
        service: &'static str,
        message: String,
    },
    /// Invalid container options
    #[error("Invalid container configuration: {0}")]
    Config(String),
    /// Registrations failed validation
    #[error("Service registrations are invalid: {0}")]
    Validation(String),
}

impl DiError {
    /// Builds a [`DiError::Factory`] from any displayable failure.
    pub fn factory(service: &'static str, message: impl std::fmt::Display) -> Self {
        DiError::Factory {
            service,
            message: message.to_string(),
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
