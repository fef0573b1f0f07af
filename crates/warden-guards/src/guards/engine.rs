//! Engine facade owning the registry shared by every chain.

use super::bound::Subject;
use super::chain::{GuardChain, GuardedOperation};
use super::config::EngineConfig;
use super::definition::{GuardDefinition, Specialization};
use super::error::GuardResult;
use super::registry::GuardRegistry;
use crate::builtin::{self, HostEnvironment};
use serde_json::Value;
use std::sync::Arc;

/// Guard engine: a registry plus the entry points host code uses at start-up.
///
/// ```rust,ignore
/// let warden = Warden::new(EngineConfig::default());
/// warden.install_builtins(host)?;
/// let publish = warden
///     .guard("publish", |doc: &Document, _| doc.publish())
///     .attach("userIsLoggedIn", vec![])?
///     .attach("persisted", vec![])?;
/// warden.lock();
/// ```
#[derive(Debug, Clone)]
pub struct Warden {
    registry: Arc<GuardRegistry>,
}

impl Warden {
    /// Engine with a fresh registry.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(Arc::new(GuardRegistry::with_config(config)))
    }

    /// Engine over an existing registry.
    pub fn with_registry(registry: Arc<GuardRegistry>) -> Self {
        Self { registry }
    }

    /// The shared registry.
    pub fn registry(&self) -> &Arc<GuardRegistry> {
        &self.registry
    }

    /// Register a guard definition.
    pub fn define(&self, definition: GuardDefinition) -> GuardResult<()> {
        self.registry.register(definition)
    }

    /// Register a specialization of an existing guard.
    pub fn specialize(
        &self,
        base: &str,
        name: impl Into<String>,
        extra: Vec<Value>,
        overrides: Specialization,
    ) -> GuardResult<()> {
        self.registry.specialize(base, name, extra, overrides)
    }

    /// Register the built-in guards against `host`.
    pub fn install_builtins(&self, host: Arc<dyn HostEnvironment>) -> GuardResult<()> {
        builtin::install(&self.registry, host)
    }

    /// Empty chain binding against this engine's registry.
    pub fn chain(&self) -> GuardChain {
        GuardChain::new(Arc::clone(&self.registry))
    }

    /// Wrap `target` behind an empty chain; attach guards to it afterwards.
    pub fn guard<S, T, E, F>(&self, name: impl Into<String>, target: F) -> GuardedOperation<S, T, E>
    where
        S: Subject,
        F: Fn(&S, &[Value]) -> Result<T, E> + Send + Sync + 'static,
    {
        self.chain().wrap(name, target)
    }

    /// Freeze the guard set.
    pub fn lock(&self) {
        self.registry.lock();
    }
}

impl Default for Warden {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
