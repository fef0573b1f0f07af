//! Bound guards and their evaluation
//!
//! Binding happens once per attachment; evaluation happens on every call.
//! A bound guard never stores call state: the subject and the raw call
//! arguments travel in an [`EvaluationContext`] built for each evaluation.

use super::definition::GuardDefinition;
use super::exception::FailureDescriptor;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

const OK_MARK: char = '✔';
const FAIL_MARK: char = '✘';

/// Method name reported before a chain is attached to an operation.
pub const UNATTACHED: &str = "<unattached>";

static NULL: Value = Value::Null;

/// Object a guarded operation is invoked on.
pub trait Subject: Any {
    /// Type name used in guard logs.
    fn type_name(&self) -> Option<&str> {
        None
    }

    /// Downcasting hook for predicates that inspect the subject.
    fn as_any(&self) -> &dyn Any;
}

/// The unit subject, for operations that are not invoked on an object.
impl Subject for () {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Lazily resolved name of the operation a chain protects.
///
/// Guards are bound before the operation they end up in front of is known,
/// so every guard of a chain shares one slot that is filled on attachment.
#[derive(Debug, Clone, Default)]
pub struct MethodName(Arc<OnceCell<String>>);

impl MethodName {
    /// An unresolved slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot resolved up front.
    pub fn resolved(name: impl Into<String>) -> Self {
        let slot = Self::new();
        slot.resolve(name);
        slot
    }

    /// Fill the slot. Returns `false` if it already held a name, which is kept.
    pub fn resolve(&self, name: impl Into<String>) -> bool {
        self.0.set(name.into()).is_ok()
    }

    /// The resolved name, or [`UNATTACHED`].
    pub fn get(&self) -> &str {
        self.0.get().map_or(UNATTACHED, String::as_str)
    }

    /// Whether the slot has been filled.
    pub fn is_resolved(&self) -> bool {
        self.0.get().is_some()
    }
}

/// What a predicate sees of the call being guarded.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Object the operation is invoked on
    pub subject: &'a dyn Subject,
    /// Arguments the operation was invoked with
    pub raw_args: &'a [Value],
    /// Name of the guarded operation
    pub method_name: &'a str,
}

impl<'a> EvaluationContext<'a> {
    /// Raw call argument at `index`, `null` when absent.
    pub fn arg(&self, index: usize) -> &'a Value {
        self.raw_args.get(index).unwrap_or(&NULL)
    }

    /// The subject as a concrete type.
    pub fn subject_as<T: Any>(&self) -> Option<&'a T> {
        self.subject.as_any().downcast_ref::<T>()
    }

    /// Subject type name, empty when the subject has none.
    pub fn type_name(&self) -> &'a str {
        self.subject.type_name().unwrap_or("")
    }
}

/// A guard definition bound to call-site arguments, ready to evaluate.
#[derive(Debug, Clone)]
pub struct BoundGuard {
    definition: Arc<GuardDefinition>,
    args: Vec<Value>,
    dependencies: Vec<BoundGuard>,
    method_name: MethodName,
    log_passes: Arc<AtomicBool>,
}

impl BoundGuard {
    pub(crate) fn new(
        definition: Arc<GuardDefinition>,
        args: Vec<Value>,
        dependencies: Vec<BoundGuard>,
        method_name: MethodName,
        log_passes: Arc<AtomicBool>,
    ) -> Self {
        Self {
            definition,
            args,
            dependencies,
            method_name,
            log_passes,
        }
    }

    /// The rule this guard was bound from.
    pub fn definition(&self) -> &GuardDefinition {
        &self.definition
    }

    /// Validated, padded arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Bound dependencies in declaration order.
    pub fn dependencies(&self) -> &[BoundGuard] {
        &self.dependencies
    }

    /// Name of the protected operation.
    pub fn method_name(&self) -> &str {
        self.method_name.get()
    }

    /// The same binding, dependencies included, reporting through `method_name`.
    pub(crate) fn rebind(&self, method_name: &MethodName) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            args: self.args.clone(),
            dependencies: self
                .dependencies
                .iter()
                .map(|dependency| dependency.rebind(method_name))
                .collect(),
            method_name: method_name.clone(),
            log_passes: Arc::clone(&self.log_passes),
        }
    }

    /// Evaluate against one call.
    ///
    /// Dependencies run first, in declaration order; the first failing
    /// dependency's own descriptor is returned and neither the remaining
    /// dependencies nor this guard's predicate run.
    pub fn evaluate(
        &self,
        subject: &dyn Subject,
        raw_args: &[Value],
    ) -> Result<(), FailureDescriptor> {
        for dependency in &self.dependencies {
            dependency.evaluate(subject, raw_args)?;
        }

        let context = EvaluationContext {
            subject,
            raw_args,
            method_name: self.method_name(),
        };
        let verdict = self.definition.check(&self.args, &context);
        let guard = self.definition.name();

        match verdict.reason(self.definition.reason()) {
            Some(reason) => {
                warn!(
                    guard,
                    subject = context.type_name(),
                    method = context.method_name,
                    reason = %reason,
                    "{FAIL_MARK} {}#{} : failed guard '{guard}' ( {reason} )",
                    context.type_name(),
                    context.method_name,
                );
                Err(FailureDescriptor::new(
                    reason,
                    self.definition.exception_id(),
                    self.definition.kind().clone(),
                ))
            }
            None => {
                if self.log_passes.load(Ordering::Relaxed) {
                    debug!(
                        guard,
                        subject = context.type_name(),
                        method = context.method_name,
                        "{OK_MARK} {}#{} : passed guard '{guard}' ( {} )",
                        context.type_name(),
                        context.method_name,
                        self.definition.reason(),
                    );
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Document {
        title: &'static str,
    }

    impl Subject for Document {
        fn type_name(&self) -> Option<&str> {
            Some("Document")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn method_name_resolves_once() {
        let slot = MethodName::new();
        assert_eq!(slot.get(), UNATTACHED);
        let shared = slot.clone();
        assert!(slot.resolve("publish"));
        assert!(!slot.resolve("other"));
        assert_eq!(shared.get(), "publish");
        assert!(MethodName::resolved("x").is_resolved());
    }

    #[test]
    fn context_exposes_subject_and_args() {
        let doc = Document { title: "draft" };
        let args = [Value::from("a")];
        let context = EvaluationContext {
            subject: &doc,
            raw_args: &args,
            method_name: "publish",
        };
        assert_eq!(context.subject_as::<Document>().map(|d| d.title), Some("draft"));
        assert!(context.subject_as::<String>().is_none());
        assert_eq!(context.arg(0), "a");
        assert!(context.arg(5).is_null());
        assert_eq!(context.type_name(), "Document");
    }
}
