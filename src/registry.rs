//! Name to factory registries
//!
//! Alternate implementations (lockers, log sinks) are selected by a name
//! from configuration. The registry is filled explicitly at start-up, the
//! name is resolved once, and the resulting object is handed to the core.

use crate::error::{VientoError, VientoResult};
use crate::lock::{platform_lock_for, HostKernel, Locker, PlatformLock, RetryPolicy};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

type Factory<T> = Box<dyn Fn() -> VientoResult<Box<T>> + Send + Sync>;

/// Registry of named factories producing `T`
pub struct FactoryRegistry<T: ?Sized> {
    kind: &'static str,
    factories: BTreeMap<String, Factory<T>>,
}

impl<T: ?Sized> FactoryRegistry<T> {
    /// Create an empty registry; `kind` names the registry in errors
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: BTreeMap::new(),
        }
    }

    /// Register (or replace) a factory under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> VientoResult<Box<T>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Build the implementation registered under `name`
    pub fn resolve(&self, name: &str) -> VientoResult<Box<T>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| VientoError::UnknownBackend {
                kind: self.kind,
                name: name.to_string(),
            })?;
        debug!("Resolving {} backend '{}'", self.kind, name);
        factory()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Check whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

/// Registry of platform lock implementations
pub type LockerRegistry = FactoryRegistry<dyn PlatformLock>;

impl LockerRegistry {
    /// Registry with the built-in lockers
    ///
    /// - `native`: the variant for the detected host kernel
    /// - `posix`: flock(2), POSIX hosts only
    /// - `windows`: LockFileEx, Windows NT hosts only
    pub fn builtin() -> Self {
        let mut registry = Self::new("locker");
        registry
            .register("native", || platform_lock_for(HostKernel::detect()))
            .register("posix", || platform_lock_for(HostKernel::Posix))
            .register("windows", || platform_lock_for(HostKernel::WindowsNt));
        registry
    }

    /// Resolve `name` and wrap it into a `Locker` with `policy`
    pub fn locker(&self, name: &str, policy: RetryPolicy) -> VientoResult<Locker> {
        let platform: Arc<dyn PlatformLock> = Arc::from(self.resolve(name)?);
        Ok(Locker::new(platform, policy))
    }
}
