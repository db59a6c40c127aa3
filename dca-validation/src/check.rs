//! Built-in rule semantics

use std::sync::LazyLock;

use futures::FutureExt;
use futures::future::BoxFuture;
use regex::Regex;
use serde_json::Map;
use serde_json::Value;

use crate::rule::Bounds;
use crate::rule::Constraint;
use crate::rule::Rule;
use crate::rule::ValueType;
use crate::rule::Verdict;

// ASCII local part and domain, TLD of at least two letters, no leading or
// trailing dots on either side.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9._%+-]*[a-zA-Z0-9])?@[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?\.[a-zA-Z]{2,}$",
    )
    .expect("valid email regex")
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("valid url regex")
});

/// Returns `true` for values `required` rejects: null, `""` and `[]`.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn is_integer(value: &Value) -> bool {
    value
        .as_f64()
        .is_some_and(|n| n.is_finite() && n.fract() == 0.0)
}

impl ValueType {
    /// Returns `true` if `value` has this shape.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_number() && is_integer(value),
            Self::Float => value.is_number() && !is_integer(value),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Email => value.as_str().is_some_and(is_email),
            Self::Url => value.as_str().is_some_and(|s| URL.is_match(s)),
        }
    }
}

fn is_email(s: &str) -> bool {
    // RFC 5321 part limits, then the shape check.
    match s.split_once('@') {
        Some((local, domain)) => local.len() <= 64 && domain.len() <= 255 && EMAIL.is_match(s),
        None => false,
    }
}

impl Bounds {
    /// Returns `true` if `value` lies within the bounds.
    ///
    /// Values that are neither strings, arrays nor numbers always pass.
    pub fn admits(&self, value: &Value) -> bool {
        let measure = match value {
            Value::String(s) => s.chars().count() as f64,
            Value::Array(items) => items.len() as f64,
            Value::Number(n) => match n.as_f64() {
                Some(n) => n,
                None => return true,
            },
            _ => return true,
        };

        if self.len.is_some_and(|len| measure != len) {
            return false;
        }
        if self.min.is_some_and(|min| measure < min) {
            return false;
        }
        if self.max.is_some_and(|max| measure > max) {
            return false;
        }
        true
    }
}

impl Constraint {
    /// Checks `value`, returning the failure message if it is rejected.
    ///
    /// `message` is reported unless a custom validator supplies its own.
    fn check<'a>(
        &'a self,
        value: &'a Value,
        record: &'a Map<String, Value>,
        empty: bool,
        message: &'a str,
    ) -> BoxFuture<'a, Option<String>> {
        async move {
            let passed = match self {
                Self::Custom(validator) => {
                    return match validator.validate(value, record).await {
                        Verdict::Pass => None,
                        Verdict::Fail => Some(message.to_string()),
                        Verdict::FailWith(message) => Some(message),
                    };
                }
                Self::All(parts) => {
                    for part in parts {
                        if let Some(failure) = part.check(value, record, empty, message).await {
                            return Some(failure);
                        }
                    }
                    return None;
                }
                _ if empty => true,
                Self::Presence => true,
                Self::Type { ty, bounds } => ty.matches(value) && bounds.admits(value),
                Self::Bounds(bounds) => bounds.admits(value),
                Self::Pattern(regex) => value.as_str().is_some_and(|s| regex.is_match(s)),
                Self::OneOf(values) => values.contains(value),
            };

            (!passed).then(|| message.to_string())
        }
        .boxed()
    }
}

impl Rule {
    /// Evaluates the rule, returning the failure message if it is violated.
    ///
    /// Empty values fail only `required`; the remaining built-in checks are
    /// skipped for them. Custom validators always run.
    pub async fn evaluate(&self, value: &Value, record: &Map<String, Value>) -> Option<String> {
        let empty = is_empty(value);
        if self.required && empty {
            return Some(self.message.clone());
        }

        self.constraint
            .check(value, record, empty, &self.message)
            .await
    }
}
