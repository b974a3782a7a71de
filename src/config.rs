//! Container options.
//!
//! Options can be built in code, read from the environment or, with the
//! `config` feature, parsed from JSON.

use std::env;
use std::str::FromStr;

use crate::{DiError, DiResult};

/// Default limit on nested resolution depth.
///
/// Each level costs several stack frames; this fits a 2 MiB thread stack
/// with room to spare.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Environment variable prefix read by [`ContainerOptions::from_env`].
pub const ENV_PREFIX: &str = "KEEL_DI";

/// What happens when a Scoped service is requested with no scope active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScopedFromRoot {
    /// Fail with [`DiError::ScopedOutsideScope`].
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "fail"))]
    Fail,
    /// Treat the provider as an implicit top-level scope with its own cache.
    #[cfg_attr(feature = "serde", serde(rename = "root", alias = "root_scope"))]
    RootScope,
}

impl FromStr for ScopedFromRoot {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(ScopedFromRoot::Fail),
            "root" | "root_scope" => Ok(ScopedFromRoot::RootScope),
            other => Err(DiError::Config(format!(
                "unknown scoped_from_root policy '{}', expected 'fail' or 'root'",
                other
            ))),
        }
    }
}

/// Runtime options for a [`ServiceProvider`](crate::ServiceProvider).
///
/// # Examples
///
/// ```
/// use keel_di::{ContainerOptions, ScopedFromRoot, ServiceCollection};
///
/// let options = ContainerOptions::new()
///     .with_max_depth(64)
///     .with_scoped_from_root(ScopedFromRoot::RootScope);
/// assert!(options.validate().is_ok());
///
/// let mut services = ServiceCollection::new();
/// services.with_options(options);
/// let provider = services.build();
/// assert_eq!(provider.options().max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContainerOptions {
    /// Maximum nesting of constructor resolution before failing
    pub max_depth: usize,
    /// Policy for Scoped services requested outside a scope
    pub scoped_from_root: ScopedFromRoot,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            scoped_from_root: ScopedFromRoot::Fail,
        }
    }
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_scoped_from_root(mut self, policy: ScopedFromRoot) -> Self {
        self.scoped_from_root = policy;
        self
    }

    /// Rejects options no container could work with.
    pub fn validate(&self) -> DiResult<()> {
        if self.max_depth == 0 {
            return Err(DiError::Config("max_depth must be at least 1".into()));
        }
        Ok(())
    }

    /// Reads `KEEL_DI_MAX_DEPTH` and `KEEL_DI_SCOPED_FROM_ROOT`, falling back
    /// to defaults for unset variables.
    pub fn from_env() -> DiResult<Self> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Like [`from_env`](Self::from_env) with a custom variable prefix.
    pub fn from_env_with_prefix(prefix: &str) -> DiResult<Self> {
        let mut options = Self::default();
        let prefix = prefix.to_uppercase();

        let depth_var = format!("{}_MAX_DEPTH", prefix);
        if let Ok(raw) = env::var(&depth_var) {
            options.max_depth = raw.trim().parse().map_err(|_| {
                DiError::Config(format!("{} must be a positive integer, got '{}'", depth_var, raw))
            })?;
        }

        let policy_var = format!("{}_SCOPED_FROM_ROOT", prefix);
        if let Ok(raw) = env::var(&policy_var) {
            options.scoped_from_root = raw.parse()?;
        }

        options.validate()?;
        tracing::debug!(?options, "container options loaded from environment");
        Ok(options)
    }

    /// Parses options from JSON; missing fields take their defaults.
    ///
    /// ```
    /// use keel_di::{ContainerOptions, ScopedFromRoot};
    ///
    /// let options = ContainerOptions::from_json(r#"{ "scoped_from_root": "root" }"#).unwrap();
    /// assert_eq!(options.scoped_from_root, ScopedFromRoot::RootScope);
    /// assert_eq!(options.max_depth, keel_di::DEFAULT_MAX_DEPTH);
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        let options: Self =
            serde_json::from_str(json).map_err(|e| DiError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }
}
