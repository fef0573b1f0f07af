//! # Warden Guards - declarative precondition enforcement
//!
//! Named, reusable guard rules are registered once at start-up, bound to the
//! arguments a call site declares, and evaluated in front of host operations.
//! The first failing guard rejects the call with a typed, structured
//! exception, delivered either as an `Err` or through a completion callback.

pub mod builtin;
pub mod guards;
pub mod prelude;

pub use guards::*;
