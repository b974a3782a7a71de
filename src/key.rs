//! Service identity types for the dependency injection container.

use std::any::TypeId;

/// Identity under which a service is registered and requested.
///
/// Keys are a small closed set of variants so that equality and hashing are
/// always well defined. The type name carried by the `Type` and `Trait`
/// variants is for diagnostics only and never takes part in comparisons.
///
/// # Key Types
///
/// - **Type**: concrete types (structs, enums, primitives)
/// - **Trait**: trait objects such as `dyn Logger`
/// - **Token**: explicit string tokens for contracts that have no Rust type
///
/// # Examples
///
/// ```rust
/// use keel_di::{Key, key_of_type, key_of_trait};
///
/// trait Clock: Send + Sync {}
///
/// let a = key_of_type::<String>();
/// let b = key_of_type::<String>();
/// assert_eq!(a, b);
///
/// let clock = key_of_trait::<dyn Clock>();
/// assert!(clock.display_name().contains("Clock"));
///
/// let token = Key::token("clock.utc");
/// assert_eq!(token, Key::Token("clock.utc"));
/// assert_ne!(token, clock);
/// ```
#[derive(Debug, Clone, Copy)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Trait-object key with the TypeId of `dyn Trait` and its name
    Trait(TypeId, &'static str),
    /// Explicit string token
    Token(&'static str),
}

impl Key {
    /// Creates a string token key.
    pub const fn token(name: &'static str) -> Self {
        Key::Token(name)
    }

    /// Get the type, trait or token name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(_, name) => name,
            Key::Token(name) => name,
        }
    }

    /// Returns true for string token keys.
    pub fn is_token(&self) -> bool {
        matches!(self, Key::Token(_))
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // TypeId comparison only, the name is diagnostics
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Trait(a, _), Key::Trait(b, _)) => a == b,
            (Key::Token(a), Key::Token(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Trait(id, _) => {
                1u8.hash(state);
                id.hash(state);
            }
            Key::Token(name) => {
                2u8.hash(state);
                name.hash(state);
            }
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Token(name) => write!(f, "token \"{}\"", name),
            other => f.write_str(other.display_name()),
        }
    }
}

/// Key for a concrete type.
#[inline(always)]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Key for a trait object type such as `dyn Logger`.
#[inline(always)]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(TypeId::of::<T>(), std::any::type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Marker {}

    #[test]
    fn type_name_does_not_affect_equality() {
        let a = Key::Type(TypeId::of::<u32>(), "u32");
        let b = Key::Type(TypeId::of::<u32>(), "renamed");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn variants_never_collide() {
        let ty = key_of_type::<Box<dyn Marker>>();
        let tr = key_of_trait::<dyn Marker>();
        let tok = Key::token("Marker");
        assert_ne!(ty, tr);
        assert_ne!(tr, tok);
        assert_ne!(ty, tok);
    }

    #[test]
    fn display_marks_tokens() {
        assert_eq!(Key::token("db").to_string(), "token \"db\"");
        assert_eq!(key_of_type::<u8>().to_string(), "u8");
    }
}
