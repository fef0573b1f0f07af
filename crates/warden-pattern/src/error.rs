//! Pattern mismatch errors

use serde::{Deserialize, Serialize};

/// A value did not match the expected pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("expected {expected} at `{path}`, found {found}")]
pub struct Mismatch {
    /// Location of the offending value, `/` separated (`""` is the root)
    pub path: String,
    /// Human readable description of the expected shape
    pub expected: String,
    /// Kind of the value that was actually found
    pub found: String,
}

impl Mismatch {
    pub(crate) fn new(
        path: &str,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self {
            path: path.to_string(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// A positional argument did not match its pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("argument {index}: {mismatch}")]
pub struct ArgumentMismatch {
    /// Zero-based position of the failing argument
    pub index: usize,
    /// Why it failed
    pub mismatch: Mismatch,
}
