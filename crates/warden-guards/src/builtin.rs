//! Built-in guards
//!
//! The engine does not know about sessions, users or persistence; the host
//! answers those questions through [`HostEnvironment`] and the guards below
//! turn the answers into rejections.

use crate::guards::{
    EvaluationContext, ExceptionKind, GuardDefinition, GuardRegistry, GuardResult, Subject,
    Verdict,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use warden_pattern::{check, Pattern};

/// Caller must be authenticated.
pub const USER_IS_LOGGED_IN: &str = "userIsLoggedIn";
/// Alias of [`USER_IS_LOGGED_IN`].
pub const USER_LOGGED_IN: &str = "userLoggedIn";
/// Must run on the server side of the host.
pub const ON_SERVER: &str = "onServer";
/// Operation arguments must match a pattern list.
pub const MATCH_PARAMS: &str = "matchParams";
/// First operation argument must name an existing user.
pub const USER_EXISTS: &str = "userExists";
/// Subject must have been persisted.
pub const PERSISTED: &str = "persisted";

/// Facts about the running host that built-in guards depend on.
pub trait HostEnvironment: Send + Sync {
    /// Identifier of the authenticated caller, if any.
    fn user_id(&self) -> Option<String>;

    /// Whether code runs on the server side.
    fn is_server(&self) -> bool;

    /// Whether a user with this identifier exists.
    fn user_exists(&self, user_id: &str) -> bool;

    /// Whether the subject has been persisted.
    fn is_persisted(&self, subject: &dyn Subject) -> bool;
}

/// Encode a pattern list as the argument of [`MATCH_PARAMS`].
pub fn match_params_arg(patterns: &[Pattern]) -> Value {
    Value::Array(patterns.iter().map(Pattern::to_value).collect())
}

/// Register every built-in guard.
pub fn install(registry: &GuardRegistry, host: Arc<dyn HostEnvironment>) -> GuardResult<()> {
    for name in [USER_IS_LOGGED_IN, USER_LOGGED_IN] {
        let host = Arc::clone(&host);
        registry.register(
            GuardDefinition::builder(name)
                .reason("Must be logged in.")
                .build(move |_, _| Verdict::fail_if(host.user_id().is_none())),
        )?;
    }

    let server = Arc::clone(&host);
    registry.register(
        GuardDefinition::builder(ON_SERVER)
            .reason("Cannot be run client side.")
            .build(move |_, _| Verdict::fail_if(!server.is_server())),
    )?;

    registry.register(
        GuardDefinition::for_arguments(MATCH_PARAMS)
            .reason("Invalid method arguments.")
            .arguments([Pattern::array_of(Pattern::Object)])
            .build(match_params),
    )?;

    let users = Arc::clone(&host);
    registry.register(
        GuardDefinition::for_arguments(USER_EXISTS)
            .reason("User does not exist.")
            .depends_on(MATCH_PARAMS, vec![match_params_arg(&[Pattern::String])])
            .build(move |_, context| {
                let exists = context
                    .arg(0)
                    .as_str()
                    .is_some_and(|user_id| users.user_exists(user_id));
                Verdict::fail_if(!exists)
            }),
    )?;

    let store = host;
    registry.register(
        GuardDefinition::builder(PERSISTED)
            .reason("Cannot call this method before its target has been persisted.")
            .kind(ExceptionKind::State)
            .build(move |_, context| Verdict::fail_if(!store.is_persisted(context.subject))),
    )?;

    debug!(guards = registry.len(), "Installed built-in guards");
    Ok(())
}

/// Validate the raw call arguments against the bound pattern list. Absent
/// arguments are checked as `null`.
fn match_params(args: &[Value], context: &EvaluationContext<'_>) -> Verdict {
    let patterns: Vec<Pattern> = match serde_json::from_value(args[0].clone()) {
        Ok(patterns) => patterns,
        Err(e) => return Verdict::fail_with(format!("Malformed pattern list: {e}")),
    };
    for (index, pattern) in patterns.iter().enumerate() {
        if let Err(mismatch) = check(context.arg(index), pattern) {
            return Verdict::fail_with(format!(
                "Method `{}` argument {index} is invalid: {mismatch}",
                context.method_name
            ));
        }
    }
    Verdict::Pass
}
