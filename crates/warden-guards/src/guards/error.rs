//! Binding-time errors
//!
//! Every variant here signals a misconfigured guard declaration. They are
//! returned from registration and attachment so start-up fails before any
//! guarded operation runs; evaluation-time rejections never use this type.

use serde::{Deserialize, Serialize};

/// Errors raised while registering, resolving or binding guards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum GuardError {
    /// A guard with this name is already registered
    #[error("Guard '{name}' already exists")]
    DuplicateName {
        /// The contested name
        name: String,
    },

    /// No guard is registered under this name
    #[error("No guard found with name '{name}'. Currently registered guards are: '{}'", .registered.join(", "))]
    UnknownGuard {
        /// The name that was looked up
        name: String,
        /// Every name registered at lookup time, in registration order
        registered: Vec<String>,
    },

    /// A bound argument has the wrong shape, or there are too many of them
    #[error("In guard '{guard}', the argument at index {index} is invalid: {message}")]
    ArgumentValidation {
        /// Guard being bound
        guard: String,
        /// Position of the offending argument
        index: usize,
        /// What was wrong with it
        message: String,
    },

    /// The dependency closure of a guard revisits a guard being bound
    #[error("Guard dependency cycle: {}", .path.join(" -> "))]
    DependencyCycle {
        /// Binding path, ending with the repeated guard
        path: Vec<String>,
    },

    /// Engine configuration could not be read or parsed
    #[error("Invalid guard configuration: {message}")]
    Config {
        /// Error message describing the problem
        message: String,
    },
}

impl GuardError {
    /// Create a duplicate name error
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// Create an unknown guard error
    pub fn unknown_guard(name: impl Into<String>, registered: Vec<String>) -> Self {
        Self::UnknownGuard {
            name: name.into(),
            registered,
        }
    }

    /// Create an argument validation error
    pub fn argument_validation(
        guard: impl Into<String>,
        index: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::ArgumentValidation {
            guard: guard.into(),
            index,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Standard result type for guard declaration
pub type GuardResult<T> = std::result::Result<T, GuardError>;
