//! Warden Guards prelude.
//!
//! Curated re-exports for declaring guards and wrapping operations.

pub use crate::builtin::{match_params_arg, HostEnvironment};
pub use crate::guards::{
    DeliveryMode, EngineConfig, EvaluationContext, ExceptionKind, FailureDescriptor,
    GuardChain, GuardDefinition, GuardError, GuardException, GuardRegistry, GuardResult,
    GuardedOperation, InvocationError, Outcome, Specialization, Subject, Verdict, Warden,
};
pub use warden_pattern::Pattern;
