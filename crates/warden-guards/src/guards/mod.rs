//! Guard engine modules
//!
//! Leaf first: `definition` describes a rule, `registry` stores and binds
//! rules, `bound` evaluates a bound rule against a call, `chain` composes
//! bound rules in front of an operation and turns a failure into one of the
//! two delivery protocols described by `exception`.

pub mod bound;
pub mod chain;
pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod exception;
pub mod registry;

pub use bound::{BoundGuard, EvaluationContext, MethodName, Subject};
pub use chain::{GuardChain, GuardedOperation, Operation, Outcome};
pub use config::{DeliveryMode, EngineConfig};
pub use definition::{
    exception_id_for, GuardDefinition, GuardDefinitionBuilder, Predicate, Specialization,
    Verdict,
};
pub use engine::Warden;
pub use error::{GuardError, GuardResult};
pub use exception::{
    ErrorContext, ExceptionKind, FailureDescriptor, GuardException, InvocationError,
    OPERATION_EXCEPTION_ID,
};
pub use registry::GuardRegistry;
