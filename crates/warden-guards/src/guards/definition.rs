//! Guard definitions: immutable, named rule templates
//!
//! A definition pairs a predicate with the static data needed to report its
//! failure (reason, exception kind and identifier), the schema its bound
//! arguments must satisfy, and the guards it depends on.

use super::bound::EvaluationContext;
use super::error::{GuardError, GuardResult};
use super::exception::ExceptionKind;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use warden_pattern::{check_arguments, Pattern};

/// Namespace prefix of every guard exception identifier.
const EXCEPTION_NAMESPACE: &str = "guard";

/// Outcome of a guard predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The precondition holds
    Pass,
    /// The precondition does not hold; report the static reason
    Fail,
    /// The precondition does not hold; append this detail to the reason
    FailWith(String),
}

impl Verdict {
    /// `Fail` when `failed` is true, `Pass` otherwise.
    pub fn fail_if(failed: bool) -> Self {
        if failed {
            Self::Fail
        } else {
            Self::Pass
        }
    }

    /// Fail with a detail appended to the static reason.
    pub fn fail_with(detail: impl Into<String>) -> Self {
        Self::FailWith(detail.into())
    }

    /// `true` unless this is `Pass`.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Pass)
    }

    /// Reason to report for this verdict, or `None` when it passed.
    ///
    /// A detail is appended to the static reason after a space. When either
    /// side is empty the other is reported alone, without a stray space.
    pub fn reason(&self, static_reason: &str) -> Option<String> {
        match self {
            Self::Pass => None,
            Self::Fail => Some(static_reason.to_string()),
            Self::FailWith(detail) if detail.is_empty() => Some(static_reason.to_string()),
            Self::FailWith(detail) if static_reason.is_empty() => Some(detail.clone()),
            Self::FailWith(detail) => Some(format!("{static_reason} {detail}")),
        }
    }
}

/// `true` means the guard fails.
impl From<bool> for Verdict {
    fn from(failed: bool) -> Self {
        Self::fail_if(failed)
    }
}

/// `None` or an empty detail passes; any other detail fails with it.
impl From<Option<String>> for Verdict {
    fn from(detail: Option<String>) -> Self {
        match detail {
            Some(detail) if !detail.is_empty() => Self::FailWith(detail),
            _ => Self::Pass,
        }
    }
}

/// Guard predicate: bound arguments plus the evaluation context.
pub type Predicate = Arc<dyn Fn(&[Value], &EvaluationContext<'_>) -> Verdict + Send + Sync>;

/// Derive the exception identifier of a guard name.
///
/// `userIsLoggedIn` becomes `guard:user-is-logged-in`: a dash goes between a
/// lowercase and an uppercase ASCII letter, then everything is lowercased.
pub fn exception_id_for(name: &str) -> String {
    let mut id = String::with_capacity(EXCEPTION_NAMESPACE.len() + 1 + name.len() + 4);
    id.push_str(EXCEPTION_NAMESPACE);
    id.push(':');
    let mut after_lower = false;
    for ch in name.chars() {
        if after_lower && ch.is_ascii_uppercase() {
            id.push('-');
            after_lower = false;
        } else {
            after_lower = ch.is_ascii_lowercase();
        }
        id.extend(ch.to_lowercase());
    }
    id
}

/// Overrides applied when specializing a guard under a new name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Specialization {
    /// Replaces the base guard's static reason
    pub reason: Option<String>,
    /// Replaces the base guard's exception kind
    pub kind: Option<ExceptionKind>,
}

impl Specialization {
    /// Override the static reason.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Override the exception kind.
    pub fn kind(mut self, kind: ExceptionKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Named, reusable rule template.
#[derive(Clone)]
pub struct GuardDefinition {
    name: String,
    reason: String,
    predicate: Predicate,
    schema: Vec<Pattern>,
    dependencies: IndexMap<String, Vec<Value>>,
    kind: ExceptionKind,
    exception_id: String,
    preset: Vec<Value>,
}

impl GuardDefinition {
    /// Start a guard on the subject or the caller; rejections default to
    /// [`ExceptionKind::Security`].
    pub fn builder(name: impl Into<String>) -> GuardDefinitionBuilder {
        GuardDefinitionBuilder::new(name.into(), ExceptionKind::Security)
    }

    /// Start a guard on the guarded operation's arguments; rejections default
    /// to [`ExceptionKind::Validation`].
    pub fn for_arguments(name: impl Into<String>) -> GuardDefinitionBuilder {
        GuardDefinitionBuilder::new(name.into(), ExceptionKind::Validation)
    }

    /// Unique guard name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static failure reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Exception kind raised on failure.
    pub fn kind(&self) -> &ExceptionKind {
        &self.kind
    }

    /// Identifier derived from the name.
    pub fn exception_id(&self) -> &str {
        &self.exception_id
    }

    /// Expected shapes of the bound arguments.
    pub fn schema(&self) -> &[Pattern] {
        &self.schema
    }

    /// Dependencies in declaration order, with the arguments they are bound with.
    pub fn dependencies(&self) -> &IndexMap<String, Vec<Value>> {
        &self.dependencies
    }

    /// Arguments prepended to every binding of a specialized guard.
    pub fn preset_arguments(&self) -> &[Value] {
        &self.preset
    }

    pub(crate) fn check(&self, args: &[Value], context: &EvaluationContext<'_>) -> Verdict {
        (self.predicate)(args, context)
    }

    /// Validate call-site arguments and pad absent trailing ones with `null`.
    ///
    /// Preset arguments of a specialized guard come first, so reported
    /// indices count them.
    pub(crate) fn prepare_arguments(
        &self,
        call_args: Vec<Value>,
        strict_arity: bool,
    ) -> GuardResult<Vec<Value>> {
        let mut args = self.preset.clone();
        args.extend(call_args);

        if strict_arity && args.len() > self.schema.len() {
            return Err(GuardError::argument_validation(
                &self.name,
                self.schema.len(),
                format!(
                    "expected at most {} argument(s), got {}",
                    self.schema.len(),
                    args.len()
                ),
            ));
        }

        check_arguments(&args, &self.schema).map_err(|e| {
            GuardError::argument_validation(&self.name, e.index, e.mismatch.to_string())
        })?;

        if args.len() < self.schema.len() {
            args.resize(self.schema.len(), Value::Null);
        }
        Ok(args)
    }

    /// Copy of this definition registered under another name, with `extra`
    /// arguments prepended to every binding.
    ///
    /// A specialization of a specialization binds the base preset first,
    /// then `extra`, then the call-site arguments.
    pub(crate) fn specialized(
        &self,
        name: String,
        extra: Vec<Value>,
        overrides: Specialization,
    ) -> Self {
        let mut preset = self.preset.clone();
        preset.extend(extra);
        Self {
            exception_id: exception_id_for(&name),
            name,
            reason: overrides.reason.unwrap_or_else(|| self.reason.clone()),
            predicate: Arc::clone(&self.predicate),
            schema: self.schema.clone(),
            dependencies: self.dependencies.clone(),
            kind: overrides.kind.unwrap_or_else(|| self.kind.clone()),
            preset,
        }
    }
}

impl fmt::Debug for GuardDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardDefinition")
            .field("name", &self.name)
            .field("reason", &self.reason)
            .field("schema", &self.schema)
            .field("dependencies", &self.dependencies)
            .field("kind", &self.kind)
            .field("exception_id", &self.exception_id)
            .field("preset", &self.preset)
            .finish_non_exhaustive()
    }
}

/// Builder for [`GuardDefinition`].
#[derive(Debug, Clone)]
pub struct GuardDefinitionBuilder {
    name: String,
    reason: String,
    schema: Vec<Pattern>,
    dependencies: IndexMap<String, Vec<Value>>,
    kind: ExceptionKind,
}

impl GuardDefinitionBuilder {
    fn new(name: String, kind: ExceptionKind) -> Self {
        Self {
            name,
            reason: String::new(),
            schema: Vec::new(),
            dependencies: IndexMap::new(),
            kind,
        }
    }

    /// Static reason reported on failure.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Expected shapes of the arguments bound at the call site.
    pub fn arguments(mut self, schema: impl IntoIterator<Item = Pattern>) -> Self {
        self.schema = schema.into_iter().collect();
        self
    }

    /// Require another guard, bound with `args`, to pass first.
    ///
    /// Declaring the same dependency twice keeps its first position and the
    /// last arguments.
    pub fn depends_on(mut self, name: impl Into<String>, args: Vec<Value>) -> Self {
        self.dependencies.insert(name.into(), args);
        self
    }

    /// Exception kind raised on failure.
    pub fn kind(mut self, kind: ExceptionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Finish the definition with its predicate.
    pub fn build<F>(self, predicate: F) -> GuardDefinition
    where
        F: Fn(&[Value], &EvaluationContext<'_>) -> Verdict + Send + Sync + 'static,
    {
        GuardDefinition {
            exception_id: exception_id_for(&self.name),
            name: self.name,
            reason: self.reason,
            predicate: Arc::new(predicate),
            schema: self.schema,
            dependencies: self.dependencies,
            kind: self.kind,
            preset: Vec::new(),
        }
    }
}
