//! Guard engine configuration.

use super::error::{GuardError, GuardResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a guard rejection reaches the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Return the exception as `Err`
    #[default]
    Throw,
    /// Hand the exception to the caller's completion callback when one is
    /// supplied, and return normally
    Callback,
}

/// Runtime settings shared by every guard bound through a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delivery protocol of newly wrapped operations
    pub delivery: DeliveryMode,
    /// Log passing guards at debug level
    pub log_passes: bool,
    /// Reject bound arguments beyond the declared schema; surplus arguments
    /// are bound unvalidated otherwise
    pub strict_arity: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryMode::Throw,
            log_passes: true,
            strict_arity: false,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document. Settings may sit at the top level or under a
    /// `[guards]` table; missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> GuardResult<Self> {
        let document: toml::Value = toml::from_str(source)
            .map_err(|e| GuardError::config(format!("Invalid TOML: {e}")))?;
        let section = match document.get("guards") {
            Some(table) => table.clone(),
            None => document,
        };
        section
            .try_into()
            .map_err(|e| GuardError::config(format!("Invalid guard settings: {e}")))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> GuardResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GuardError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }
}
