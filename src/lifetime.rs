//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use keel_di::{ServiceCollection, Resolver, Lifetime};
///
/// #[derive(Default)]
/// struct Database;
/// #[derive(Default)]
/// struct Repository;
/// #[derive(Default)]
/// struct RequestModel;
///
/// keel_di::injectable_default!(Database, Repository, RequestModel);
///
/// let mut services = ServiceCollection::new();
/// services
///     .add_singleton::<Database>()
///     .add_scoped::<Repository>()
///     .add_transient::<RequestModel>();
///
/// let provider = services.build();
///
/// // Singleton: same instance across scopes
/// let scope1 = provider.create_scope();
/// let db1 = provider.get_required::<Database>();
/// let db2 = scope1.get_required::<Database>();
/// assert!(std::sync::Arc::ptr_eq(&db1, &db2));
///
/// // Scoped: same within a scope, different across scopes
/// let scope2 = provider.create_scope();
/// let r1 = scope1.get_required::<Repository>();
/// let r2 = scope1.get_required::<Repository>();
/// let r3 = scope2.get_required::<Repository>();
/// assert!(std::sync::Arc::ptr_eq(&r1, &r2));
/// assert!(!std::sync::Arc::ptr_eq(&r1, &r3));
///
/// // Transient: always different
/// let m1 = scope1.get_required::<RequestModel>();
/// let m2 = scope1.get_required::<RequestModel>();
/// assert!(!std::sync::Arc::ptr_eq(&m1, &m2));
/// # let _ = Lifetime::Singleton;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Lifetime {
    /// Single instance per root provider, shared by every scope created from it.
    Singleton,
    /// Single instance per scope, released when the scope is disposed.
    Scoped,
    /// New instance per resolution, never cached.
    Transient,
}

impl Lifetime {
    /// Whether instances of this lifetime are kept in some cache tier.
    pub fn is_cached(self) -> bool {
        !matches!(self, Lifetime::Transient)
    }
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        };
        f.write_str(s)
    }
}
