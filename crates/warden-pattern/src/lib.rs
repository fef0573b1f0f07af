//! # Warden Pattern - structural argument validation
//!
//! A small, closed vocabulary of shapes that guard arguments and guarded
//! operation arguments are checked against. Values are `serde_json::Value`
//! so that host applications can hand arbitrary data to guards without the
//! engine knowing their concrete types.

mod error;
mod pattern;

pub use error::{ArgumentMismatch, Mismatch};
pub use pattern::{check, check_arguments, kind_of, validate, Pattern};
