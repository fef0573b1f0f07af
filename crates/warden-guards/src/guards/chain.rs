//! Guard chains and the interception wrapper
//!
//! A [`GuardChain`] is an ordered list of bound guards evaluated with
//! short-circuiting. Wrapping it around an operation yields a
//! [`GuardedOperation`], which either forwards the call or turns the first
//! failure into a [`GuardException`] delivered by throw or by callback.

use super::bound::{BoundGuard, MethodName, Subject};
use super::config::DeliveryMode;
use super::error::GuardResult;
use super::exception::{FailureDescriptor, GuardException, InvocationError};
use super::registry::GuardRegistry;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Target operation behind a guard chain.
pub type Operation<S, T, E> = Box<dyn Fn(&S, &[Value]) -> Result<T, E> + Send + Sync>;

/// Ordered guards protecting one operation.
#[derive(Debug, Clone)]
pub struct GuardChain {
    registry: Arc<GuardRegistry>,
    guards: Vec<BoundGuard>,
    method_name: MethodName,
}

impl GuardChain {
    /// Empty chain binding against `registry`.
    pub fn new(registry: Arc<GuardRegistry>) -> Self {
        Self {
            registry,
            guards: Vec::new(),
            method_name: MethodName::new(),
        }
    }

    /// Bind the guard `name` with `args` and append it.
    pub fn guard(mut self, name: &str, args: Vec<Value>) -> GuardResult<Self> {
        self.push(name, args)?;
        Ok(self)
    }

    /// In-place form of [`guard`](Self::guard).
    pub fn push(&mut self, name: &str, args: Vec<Value>) -> GuardResult<()> {
        let bound = self.registry.bind(name, args, &self.method_name)?;
        self.guards.push(bound);
        Ok(())
    }

    /// Bound guards in attachment order.
    pub fn guards(&self) -> &[BoundGuard] {
        &self.guards
    }

    /// Number of attached guards.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// `true` if no guard is attached.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Name of the protected operation, once attached.
    pub fn method_name(&self) -> &str {
        self.method_name.get()
    }

    /// Evaluate every guard in order, stopping at the first failure.
    pub fn evaluate(
        &self,
        subject: &dyn Subject,
        raw_args: &[Value],
    ) -> Result<(), FailureDescriptor> {
        self.guards
            .iter()
            .try_for_each(|guard| guard.evaluate(subject, raw_args))
    }

    /// Put the chain in front of `target`, naming the operation `name`.
    ///
    /// The delivery mode defaults to the registry configuration. A chain
    /// whose name slot was already filled, e.g. a clone of a chain wrapped
    /// elsewhere, is rebound to a slot of its own first.
    pub fn wrap<S, T, E, F>(
        mut self,
        name: impl Into<String>,
        target: F,
    ) -> GuardedOperation<S, T, E>
    where
        S: Subject,
        F: Fn(&S, &[Value]) -> Result<T, E> + Send + Sync + 'static,
    {
        let name = name.into();
        if !self.method_name.resolve(name.clone()) {
            debug!(
                operation = %name,
                previous = self.method_name(),
                "Guard chain already attached, rebinding its guards"
            );
            let slot = MethodName::resolved(name.clone());
            self.guards = self.guards.iter().map(|guard| guard.rebind(&slot)).collect();
            self.method_name = slot;
        }
        GuardedOperation {
            delivery: self.registry.config().delivery,
            name,
            chain: self,
            target: Box::new(target),
        }
    }
}

/// Result of a call that completed without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation ran and returned this value
    Completed(T),
    /// A guard rejected the call and the exception went to the callback
    Delivered,
}

impl<T> Outcome<T> {
    /// The operation's value, if it ran.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Delivered => None,
        }
    }

    /// `true` if the rejection went to the callback.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// An operation behind a guard chain.
pub struct GuardedOperation<S, T, E> {
    name: String,
    chain: GuardChain,
    target: Operation<S, T, E>,
    delivery: DeliveryMode,
}

impl<S, T, E> GuardedOperation<S, T, E>
where
    S: Subject,
    E: fmt::Display,
{
    /// Append one more guard to the chain already wrapping this operation.
    pub fn attach(mut self, name: &str, args: Vec<Value>) -> GuardResult<Self> {
        self.chain.push(name, args)?;
        Ok(self)
    }

    /// Select the delivery protocol.
    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The guard chain in front of the operation.
    pub fn chain(&self) -> &GuardChain {
        &self.chain
    }

    /// Delivery protocol in use.
    pub fn delivery(&self) -> DeliveryMode {
        self.delivery
    }

    /// Call with the throw protocol: a rejection comes back as `Err`.
    pub fn invoke(&self, subject: &S, args: &[Value]) -> Result<T, InvocationError<E>> {
        if let Err(descriptor) = self.chain.evaluate(subject, args) {
            return Err(InvocationError::Rejected(GuardException::new(descriptor)));
        }
        (self.target)(subject, args).map_err(InvocationError::operation)
    }

    /// Call with the configured delivery protocol.
    ///
    /// In [`DeliveryMode::Callback`] a rejection is handed to `callback` and
    /// the call returns [`Outcome::Delivered`]. Without a callback, or in
    /// [`DeliveryMode::Throw`], the rejection is returned as `Err`. Errors of
    /// the operation itself are always returned.
    pub fn dispatch(
        &self,
        subject: &S,
        args: &[Value],
        callback: Option<&mut dyn FnMut(GuardException)>,
    ) -> Result<Outcome<T>, InvocationError<E>> {
        if let Err(descriptor) = self.chain.evaluate(subject, args) {
            let exception = GuardException::new(descriptor);
            return match (self.delivery, callback) {
                (DeliveryMode::Callback, Some(callback)) => {
                    callback(exception);
                    Ok(Outcome::Delivered)
                }
                _ => Err(InvocationError::Rejected(exception)),
            };
        }
        (self.target)(subject, args)
            .map(Outcome::Completed)
            .map_err(InvocationError::operation)
    }
}

impl<S, T, E> fmt::Debug for GuardedOperation<S, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedOperation")
            .field("name", &self.name)
            .field("chain", &self.chain)
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::definition::{GuardDefinition, Verdict};
    use crate::guards::exception::ExceptionKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> Arc<GuardRegistry> {
        let registry = GuardRegistry::new();
        registry
            .register(GuardDefinition::builder("open").build(|_, _| Verdict::Pass))
            .unwrap();
        registry
            .register(
                GuardDefinition::builder("closed")
                    .reason("Closed.")
                    .build(|_, _| Verdict::Fail),
            )
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn wrap_resolves_the_method_name_for_every_guard() {
        let chain = GuardChain::new(registry()).guard("open", vec![]).unwrap();
        assert_eq!(chain.method_name(), crate::guards::bound::UNATTACHED);
        let op = chain.wrap("publish", |_: &(), _: &[Value]| Ok::<_, String>(()));
        assert_eq!(op.chain().guards()[0].method_name(), "publish");
        assert_eq!(op.name(), "publish");
    }

    #[test]
    fn cloned_template_reports_each_operation_name() {
        let template = GuardChain::new(registry()).guard("open", vec![]).unwrap();
        let publish = template
            .clone()
            .wrap("publish", |_: &(), _: &[Value]| Ok::<_, String>(()));
        let delete = template.wrap("delete", |_: &(), _: &[Value]| Ok::<_, String>(()));
        assert_eq!(publish.chain().guards()[0].method_name(), "publish");
        assert_eq!(delete.name(), "delete");
        assert_eq!(delete.chain().method_name(), "delete");
        assert_eq!(delete.chain().guards()[0].method_name(), "delete");

        let delete = delete.attach("open", vec![]).unwrap();
        assert_eq!(delete.chain().guards()[1].method_name(), "delete");
    }

    #[test]
    fn empty_chain_always_delegates() {
        let op = GuardChain::new(registry()).wrap("noop", |_: &(), args: &[Value]| {
            Ok::<_, String>(args.len())
        });
        assert_eq!(op.invoke(&(), &[Value::Null, Value::Null]).unwrap(), 2);
    }

    #[test]
    fn callback_delivery_needs_a_callback() {
        let op = GuardChain::new(registry())
            .guard("closed", vec![])
            .unwrap()
            .wrap("shut", |_: &(), _: &[Value]| Ok::<_, String>(()))
            .with_delivery(DeliveryMode::Callback);

        let received = AtomicUsize::new(0);
        let callback: &mut dyn FnMut(GuardException) = &mut |exception| {
            assert_eq!(exception.kind(), &ExceptionKind::Security);
            assert_eq!(exception.reason(), "Closed.");
            received.fetch_add(1, Ordering::SeqCst);
        };
        let outcome = op.dispatch(&(), &[], Some(callback)).unwrap();
        assert!(outcome.is_delivered());
        assert_eq!(received.load(Ordering::SeqCst), 1);

        let err = op.dispatch(&(), &[], None).unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn throw_delivery_ignores_the_callback() {
        let op = GuardChain::new(registry())
            .guard("closed", vec![])
            .unwrap()
            .wrap("shut", |_: &(), _: &[Value]| Ok::<_, String>(()));
        let called = AtomicUsize::new(0);
        let callback: &mut dyn FnMut(GuardException) = &mut |_| {
            called.fetch_add(1, Ordering::SeqCst);
        };
        let err = op.dispatch(&(), &[], Some(callback)).unwrap_err();
        assert_eq!(err.exception_id(), "guard:closed");
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }
}
