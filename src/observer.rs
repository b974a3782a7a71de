//! Diagnostic observers for dependency injection traceability.
//!
//! Observers are notified synchronously around every resolution request,
//! including cache hits and requests for the provider itself. With no
//! observers registered the resolver skips the timing and notification work
//! entirely.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::Key;

/// Observer trait for dependency injection resolution events.
///
/// Keep implementations lightweight; they run inline with resolution.
///
/// # Examples
///
/// ```
/// use keel_di::{DiObserver, ServiceCollection, Key, Resolver};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder {
///     seen: Mutex<Vec<String>>,
/// }
///
/// impl DiObserver for Recorder {
///     fn resolving(&self, key: &Key) {
///         self.seen.lock().unwrap().push(format!("resolving {}", key));
///     }
///
///     fn resolved(&self, key: &Key, _duration: Duration) {
///         self.seen.lock().unwrap().push(format!("resolved {}", key));
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut services = ServiceCollection::new();
/// services.add_singleton_instance(7u8);
/// services.add_observer(recorder.clone());
///
/// let provider = services.build();
/// provider.get_required::<u8>();
/// assert_eq!(recorder.seen.lock().unwrap().len(), 2);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called when starting to resolve a service.
    fn resolving(&self, key: &Key);

    /// Called when a service is successfully resolved.
    ///
    /// `duration` is measured from the matching `resolving` call.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when resolution of `key` fails.
    ///
    /// Nested failures are reported once per level of the resolution path.
    fn failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }
}

/// Container for registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    /// Returns true if any observers are registered.
    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.failed(key, error);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Resolution start and finish are emitted at `trace` level, failures at
/// `warn`. Install a subscriber (e.g. `tracing-subscriber`) to see them.
///
/// # Examples
///
/// ```
/// use keel_di::{ServiceCollection, LoggingObserver};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(LoggingObserver::new()));
/// let provider = services.build();
/// ```
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a new logging observer with default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "keel-di".to_string(),
        }
    }

    /// Creates a new logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        tracing::trace!(prefix = %self.prefix, service = %key, "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::trace!(
            prefix = %self.prefix,
            service = %key,
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn failed(&self, key: &Key, error: &DiError) {
        tracing::warn!(prefix = %self.prefix, service = %key, %error, "resolution failed");
    }
}
