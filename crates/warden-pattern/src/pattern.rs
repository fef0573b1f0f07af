//! Structural patterns and the validator that checks values against them

use crate::error::{ArgumentMismatch, Mismatch};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

static NULL: Value = Value::Null;

/// Expected shape of a value.
///
/// The set of shapes is closed on purpose: validation is a structural walk
/// over the value, never a user supplied callback. Patterns serialize to a
/// tagged JSON form (`{"type": "optional", "of": {"type": "string"}}`) so a
/// pattern list can itself travel as a guard argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum Pattern {
    /// Matches every value, including `null`
    Any,
    /// A JSON string
    String,
    /// Any JSON number
    Number,
    /// A number without a fractional part
    Integer,
    /// `true` or `false`
    Boolean,
    /// Exactly `null`
    Null,
    /// Any JSON array
    Array,
    /// Any JSON object
    Object,
    /// `null` or the inner pattern
    Optional(Box<Pattern>),
    /// An array whose every element matches the inner pattern
    ArrayOf(Box<Pattern>),
    /// An array of fixed arity, element `i` matching pattern `i`
    Tuple(Vec<Pattern>),
    /// An object with exactly these keys; optional fields may be absent
    Record(BTreeMap<String, Pattern>),
    /// At least one of the alternatives
    OneOf(Vec<Pattern>),
    /// Structural equality with a fixed value
    Literal(Value),
}

impl Pattern {
    /// `null` or `inner`.
    pub fn optional(inner: Pattern) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Homogeneous array of `inner`.
    pub fn array_of(inner: Pattern) -> Self {
        Self::ArrayOf(Box::new(inner))
    }

    /// Fixed arity array.
    pub fn tuple(items: impl IntoIterator<Item = Pattern>) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    /// Closed object shape.
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Pattern)>) -> Self {
        Self::Record(fields.into_iter().map(|(k, p)| (k.into(), p)).collect())
    }

    /// Union of alternatives.
    pub fn one_of(options: impl IntoIterator<Item = Pattern>) -> Self {
        Self::OneOf(options.into_iter().collect())
    }

    /// Exact value.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Whether an absent (`null`) value satisfies this pattern.
    pub fn accepts_absent(&self) -> bool {
        check(&NULL, self).is_ok()
    }

    /// Serialize the pattern into its tagged JSON form.
    pub fn to_value(&self) -> Value {
        // Serializing an enum of strings, vectors and maps cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => write!(f, "any"),
            Pattern::String => write!(f, "string"),
            Pattern::Number => write!(f, "number"),
            Pattern::Integer => write!(f, "integer"),
            Pattern::Boolean => write!(f, "boolean"),
            Pattern::Null => write!(f, "null"),
            Pattern::Array => write!(f, "array"),
            Pattern::Object => write!(f, "object"),
            Pattern::Optional(inner) => write!(f, "optional {inner}"),
            Pattern::ArrayOf(inner) => write!(f, "array of {inner}"),
            Pattern::Tuple(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Pattern::Record(fields) => {
                write!(f, "{{")?;
                for (i, (key, field)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {field}")?;
                }
                write!(f, "}}")
            }
            Pattern::OneOf(options) => {
                write!(f, "one of (")?;
                for (i, option) in options.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{option}")?;
                }
                write!(f, ")")
            }
            Pattern::Literal(value) => write!(f, "literal {value}"),
        }
    }
}

/// Short name of a value's JSON kind, used in mismatch reports.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `true` if `value` matches `pattern`.
pub fn validate(value: &Value, pattern: &Pattern) -> bool {
    check(value, pattern).is_ok()
}

/// Check `value` against `pattern`, reporting the first mismatch found.
pub fn check(value: &Value, pattern: &Pattern) -> Result<(), Mismatch> {
    check_at(value, pattern, "")
}

/// Check a positional argument list.
///
/// Only positions present in both `args` and `patterns` are compared; arity
/// policy (padding, surplus arguments) belongs to the caller.
pub fn check_arguments(args: &[Value], patterns: &[Pattern]) -> Result<(), ArgumentMismatch> {
    for (index, (arg, pattern)) in args.iter().zip(patterns).enumerate() {
        check(arg, pattern).map_err(|mismatch| ArgumentMismatch { index, mismatch })?;
    }
    Ok(())
}

fn mismatch(path: &str, pattern: &Pattern, value: &Value) -> Mismatch {
    Mismatch::new(path, pattern.to_string(), kind_of(value))
}

fn require(ok: bool, path: &str, pattern: &Pattern, value: &Value) -> Result<(), Mismatch> {
    if ok {
        Ok(())
    } else {
        Err(mismatch(path, pattern, value))
    }
}

fn check_at(value: &Value, pattern: &Pattern, path: &str) -> Result<(), Mismatch> {
    match pattern {
        Pattern::Any => Ok(()),
        Pattern::String => require(value.is_string(), path, pattern, value),
        Pattern::Number => require(value.is_number(), path, pattern, value),
        Pattern::Integer => require(value.is_i64() || value.is_u64(), path, pattern, value),
        Pattern::Boolean => require(value.is_boolean(), path, pattern, value),
        Pattern::Null => require(value.is_null(), path, pattern, value),
        Pattern::Array => require(value.is_array(), path, pattern, value),
        Pattern::Object => require(value.is_object(), path, pattern, value),
        Pattern::Optional(inner) => {
            if value.is_null() {
                Ok(())
            } else {
                check_at(value, inner, path)
            }
        }
        Pattern::ArrayOf(inner) => {
            let items = value
                .as_array()
                .ok_or_else(|| mismatch(path, pattern, value))?;
            for (i, item) in items.iter().enumerate() {
                check_at(item, inner, &format!("{path}/{i}"))?;
            }
            Ok(())
        }
        Pattern::Tuple(expected) => {
            let items = value
                .as_array()
                .ok_or_else(|| mismatch(path, pattern, value))?;
            if items.len() != expected.len() {
                return Err(Mismatch::new(
                    path,
                    pattern.to_string(),
                    format!("array of length {}", items.len()),
                ));
            }
            for (i, (item, item_pattern)) in items.iter().zip(expected).enumerate() {
                check_at(item, item_pattern, &format!("{path}/{i}"))?;
            }
            Ok(())
        }
        Pattern::Record(fields) => {
            let object = value
                .as_object()
                .ok_or_else(|| mismatch(path, pattern, value))?;
            if let Some(extra) = object.keys().find(|key| !fields.contains_key(*key)) {
                return Err(Mismatch::new(
                    &format!("{path}/{extra}"),
                    "no such field",
                    "unexpected key",
                ));
            }
            for (key, field) in fields {
                let field_value = object.get(key).unwrap_or(&NULL);
                check_at(field_value, field, &format!("{path}/{key}"))?;
            }
            Ok(())
        }
        Pattern::OneOf(options) => require(
            options.iter().any(|option| check_at(value, option, path).is_ok()),
            path,
            pattern,
            value,
        ),
        Pattern::Literal(expected) => require(value == expected, path, pattern, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn primitives_match_their_kind_only() {
        assert!(validate(&json!("a"), &Pattern::String));
        assert!(!validate(&json!(1), &Pattern::String));
        assert!(validate(&json!(1.5), &Pattern::Number));
        assert!(validate(&json!(3), &Pattern::Integer));
        assert!(!validate(&json!(3.2), &Pattern::Integer));
        assert!(validate(&json!(false), &Pattern::Boolean));
        assert!(validate(&Value::Null, &Pattern::Null));
        assert!(validate(&json!([]), &Pattern::Array));
        assert!(validate(&json!({}), &Pattern::Object));
        assert!(validate(&Value::Null, &Pattern::Any));
    }

    #[test]
    fn optional_accepts_null_and_inner() {
        let pattern = Pattern::optional(Pattern::String);
        assert!(validate(&Value::Null, &pattern));
        assert!(validate(&json!("x"), &pattern));
        assert!(!validate(&json!(7), &pattern));
        assert!(pattern.accepts_absent());
        assert!(!Pattern::String.accepts_absent());
    }

    #[test]
    fn nested_mismatch_reports_path() {
        let pattern = Pattern::record([("ids", Pattern::array_of(Pattern::String))]);
        let err = check(&json!({ "ids": ["a", 2] }), &pattern).unwrap_err();
        assert_eq!(err.path, "/ids/1");
        assert_eq!(err.expected, "string");
        assert_eq!(err.found, "integer");
    }

    #[test]
    fn tuple_enforces_arity() {
        let pattern = Pattern::tuple([Pattern::String, Pattern::Integer]);
        assert!(validate(&json!(["a", 1]), &pattern));
        let err = check(&json!(["a"]), &pattern).unwrap_err();
        assert_eq!(err.found, "array of length 1");
    }

    #[test]
    fn record_rejects_unknown_keys_and_allows_missing_optionals() {
        let pattern = Pattern::record([
            ("name", Pattern::String),
            ("age", Pattern::optional(Pattern::Integer)),
        ]);
        assert!(validate(&json!({ "name": "ada" }), &pattern));
        let err = check(&json!({ "name": "ada", "admin": true }), &pattern).unwrap_err();
        assert_eq!(err.path, "/admin");
    }

    #[test]
    fn one_of_and_literal() {
        let pattern = Pattern::one_of([Pattern::literal("read"), Pattern::literal("write")]);
        assert!(validate(&json!("write"), &pattern));
        assert!(!validate(&json!("admin"), &pattern));
    }

    #[test]
    fn check_arguments_reports_failing_index() {
        let patterns = [Pattern::String, Pattern::Integer];
        let err = check_arguments(&[json!("a"), json!("b")], &patterns).unwrap_err();
        assert_eq!(err.index, 1);
        // Absent trailing arguments are not compared here.
        assert_matches!(check_arguments(&[json!("a")], &patterns), Ok(()));
    }

    #[test]
    fn patterns_survive_json_round_trip() {
        let pattern = Pattern::array_of(Pattern::optional(Pattern::String));
        let value = pattern.to_value();
        assert_eq!(value["type"], "array_of");
        let back: Pattern = serde_json::from_value(value).unwrap();
        assert_eq!(back, pattern);
    }

    proptest! {
        #[test]
        fn any_string_matches_string_pattern(s in ".*") {
            prop_assert!(validate(&json!(s), &Pattern::String));
            prop_assert!(!validate(&json!(s), &Pattern::Integer));
        }

        #[test]
        fn integers_match_number_and_integer(n in any::<i64>()) {
            prop_assert!(validate(&json!(n), &Pattern::Number));
            prop_assert!(validate(&json!(n), &Pattern::Integer));
        }
    }
}
