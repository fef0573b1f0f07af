//! Guard registry: the name-keyed store every binding resolves against
//!
//! Registration is expected to finish before any guarded operation runs.
//! [`GuardRegistry::lock`] freezes the guard set; later writes are ignored.

use super::bound::{BoundGuard, MethodName};
use super::config::EngineConfig;
use super::definition::{GuardDefinition, Specialization};
use super::error::{GuardError, GuardResult};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name-keyed store of guard definitions.
#[derive(Debug)]
pub struct GuardRegistry {
    definitions: RwLock<IndexMap<String, Arc<GuardDefinition>>>,
    locked: AtomicBool,
    log_passes: Arc<AtomicBool>,
    config: EngineConfig,
}

impl Default for GuardRegistry {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl GuardRegistry {
    /// Empty registry with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry with an explicit configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            definitions: RwLock::default(),
            locked: AtomicBool::new(false),
            log_passes: Arc::new(AtomicBool::new(config.log_passes)),
            config,
        }
    }

    /// Configuration applied to every binding.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a definition under its name.
    ///
    /// Ignored once the registry is locked.
    pub fn register(&self, definition: GuardDefinition) -> GuardResult<()> {
        let mut definitions = self.definitions.write();
        if self.is_locked() {
            warn!(guard = definition.name(), "Registry locked, ignoring registration");
            return Ok(());
        }
        if definitions.contains_key(definition.name()) {
            return Err(GuardError::duplicate_name(definition.name()));
        }
        debug!(
            guard = definition.name(),
            exception_id = definition.exception_id(),
            kind = %definition.kind(),
            "Registered guard"
        );
        definitions.insert(definition.name().to_string(), Arc::new(definition));
        Ok(())
    }

    /// Resolve a definition by name.
    pub fn lookup(&self, name: &str) -> GuardResult<Arc<GuardDefinition>> {
        let definitions = self.definitions.read();
        definitions.get(name).cloned().ok_or_else(|| {
            GuardError::unknown_guard(name, definitions.keys().cloned().collect())
        })
    }

    /// Whether a guard is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.read().contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.definitions.read().keys().cloned().collect()
    }

    /// Number of registered guards.
    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }

    /// Register `name` as a copy of `base` whose bindings are prefixed with
    /// `extra` arguments.
    ///
    /// Ignored once the registry is locked.
    pub fn specialize(
        &self,
        base: &str,
        name: impl Into<String>,
        extra: Vec<Value>,
        overrides: Specialization,
    ) -> GuardResult<()> {
        let name = name.into();
        if self.is_locked() {
            warn!(guard = %name, base, "Registry locked, ignoring specialization");
            return Ok(());
        }
        let specialized = self.lookup(base)?.specialized(name, extra, overrides);
        debug!(
            guard = specialized.name(),
            base,
            preset = specialized.preset_arguments().len(),
            "Specializing guard"
        );
        self.register(specialized)
    }

    /// Freeze the guard set for the rest of the process lifetime.
    ///
    /// Passing guards stop logging from here on, including guards bound
    /// before the lock. Failures are still logged.
    pub fn lock(&self) {
        if !self.locked.swap(true, Ordering::AcqRel) {
            self.log_passes.store(false, Ordering::Relaxed);
            info!(guards = self.len(), "Guard registry locked");
        }
    }

    /// Whether [`lock`](Self::lock) has been called.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Bind the guard `name` to call-site `args`.
    ///
    /// Arguments are validated against the schema, dependencies are bound
    /// eagerly with their declared arguments and the same method name, and a
    /// dependency cycle is reported instead of recursing forever.
    pub fn bind(
        &self,
        name: &str,
        args: Vec<Value>,
        method_name: &MethodName,
    ) -> GuardResult<BoundGuard> {
        let mut path = Vec::new();
        self.bind_on_path(name, args, method_name, &mut path)
    }

    fn bind_on_path(
        &self,
        name: &str,
        args: Vec<Value>,
        method_name: &MethodName,
        path: &mut Vec<String>,
    ) -> GuardResult<BoundGuard> {
        if path.iter().any(|bound| bound == name) {
            let mut cycle = path.clone();
            cycle.push(name.to_string());
            return Err(GuardError::DependencyCycle { path: cycle });
        }

        let definition = self.lookup(name)?;
        let args = definition.prepare_arguments(args, self.config.strict_arity)?;

        path.push(name.to_string());
        let mut dependencies = Vec::with_capacity(definition.dependencies().len());
        for (dependency, dependency_args) in definition.dependencies() {
            dependencies.push(self.bind_on_path(
                dependency,
                dependency_args.clone(),
                method_name,
                path,
            )?);
        }
        path.pop();

        Ok(BoundGuard::new(
            definition,
            args,
            dependencies,
            method_name.clone(),
            Arc::clone(&self.log_passes),
        ))
    }
}
