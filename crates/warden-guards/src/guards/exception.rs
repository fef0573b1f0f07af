//! Failure descriptors and the exceptions they materialize into
//!
//! A guard rejection starts life as a [`FailureDescriptor`] value and only
//! becomes an error at the interception boundary, where it is wrapped in a
//! [`GuardException`] tagged with its [`ExceptionKind`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exception identifier attached to errors raised by a guarded operation itself.
pub const OPERATION_EXCEPTION_ID: &str = "operation:failed";

/// Taxonomy tag selecting which exception a failure is raised as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    /// Access denied; the default for guards on the subject or the caller
    #[default]
    Security,
    /// Malformed input; the default for guards on method arguments
    Validation,
    /// The subject is not in a state that allows the call
    State,
    /// Host-defined kind, registered by name so reporters can listen for it
    Custom(String),
}

impl ExceptionKind {
    /// Create a host-defined exception kind.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Stable name of the exception this kind is raised as.
    pub fn name(&self) -> &str {
        match self {
            ExceptionKind::Security => "SecurityException",
            ExceptionKind::Validation => "ValidationException",
            ExceptionKind::State => "StateException",
            ExceptionKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a guarded call was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDescriptor {
    /// Static reason of the failing guard, possibly followed by its detail
    pub reason: String,
    /// Identifier derived from the failing guard's name
    pub exception_id: String,
    /// Exception the failure is raised as
    pub exception_kind: ExceptionKind,
}

impl FailureDescriptor {
    /// Create a failure descriptor.
    pub fn new(
        reason: impl Into<String>,
        exception_id: impl Into<String>,
        exception_kind: ExceptionKind,
    ) -> Self {
        Self {
            reason: reason.into(),
            exception_id: exception_id.into(),
            exception_kind,
        }
    }

    /// Reduce to the minimal serializable shape.
    pub fn to_context(&self) -> ErrorContext {
        ErrorContext {
            exception_id: self.exception_id.clone(),
            reason: self.reason.clone(),
        }
    }
}

/// Minimal error shape shared across process boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    /// Machine readable identifier
    pub exception_id: String,
    /// Human readable reason
    pub reason: String,
}

/// A guard rejection raised at the interception boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{}] {}", .descriptor.exception_id, .descriptor.reason)]
pub struct GuardException {
    descriptor: FailureDescriptor,
}

impl GuardException {
    /// Materialize a failure descriptor.
    pub fn new(descriptor: FailureDescriptor) -> Self {
        Self { descriptor }
    }

    /// Kind this exception was raised as.
    pub fn kind(&self) -> &ExceptionKind {
        &self.descriptor.exception_kind
    }

    /// Exception identifier, the error code seen by remote callers.
    pub fn error(&self) -> &str {
        &self.descriptor.exception_id
    }

    /// Reason of the rejection.
    pub fn reason(&self) -> &str {
        &self.descriptor.reason
    }

    /// Structured context the exception was raised with.
    pub fn descriptor(&self) -> &FailureDescriptor {
        &self.descriptor
    }

    /// Wire representation of this exception.
    pub fn context(&self) -> ErrorContext {
        self.descriptor.to_context()
    }

    /// Take back the descriptor.
    pub fn into_descriptor(self) -> FailureDescriptor {
        self.descriptor
    }
}

impl From<FailureDescriptor> for GuardException {
    fn from(descriptor: FailureDescriptor) -> Self {
        Self::new(descriptor)
    }
}

/// Error returned by a guarded operation.
///
/// Both variants carry the same structured context so upstream handlers can
/// dispatch on [`exception_id`](Self::exception_id) and
/// [`exception_kind`](Self::exception_kind) alone.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError<E> {
    /// A guard rejected the call; the operation did not run
    #[error(transparent)]
    Rejected(GuardException),

    /// The operation ran and failed
    #[error("{error}")]
    Operation {
        /// The operation's own error, untouched
        error: E,
        /// Context attached for uniform handling
        context: ErrorContext,
    },
}

impl<E: fmt::Display> InvocationError<E> {
    /// Annotate an error raised by the guarded operation.
    pub fn operation(error: E) -> Self {
        let context = ErrorContext {
            exception_id: OPERATION_EXCEPTION_ID.to_string(),
            reason: error.to_string(),
        };
        Self::Operation { error, context }
    }
}

impl<E> InvocationError<E> {
    /// `true` if a guard rejected the call.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Exception kind of a rejection; `None` for operation errors.
    pub fn exception_kind(&self) -> Option<&ExceptionKind> {
        match self {
            Self::Rejected(exception) => Some(exception.kind()),
            Self::Operation { .. } => None,
        }
    }

    /// Exception identifier of either variant.
    pub fn exception_id(&self) -> &str {
        match self {
            Self::Rejected(exception) => exception.error(),
            Self::Operation { context, .. } => &context.exception_id,
        }
    }

    /// Reason of either variant.
    pub fn reason(&self) -> &str {
        match self {
            Self::Rejected(exception) => exception.reason(),
            Self::Operation { context, .. } => &context.reason,
        }
    }

    /// Structured context of either variant.
    pub fn context(&self) -> ErrorContext {
        match self {
            Self::Rejected(exception) => exception.context(),
            Self::Operation { context, .. } => context.clone(),
        }
    }

    /// The guard exception, if this is a rejection.
    pub fn rejection(&self) -> Option<&GuardException> {
        match self {
            Self::Rejected(exception) => Some(exception),
            Self::Operation { .. } => None,
        }
    }

    /// The operation's own error, if the operation ran.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Rejected(_) => None,
            Self::Operation { error, .. } => Some(error),
        }
    }
}
