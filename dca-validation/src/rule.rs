//! Rule vocabulary and its loose JSON authoring shape

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::RuleError;

// =============================================================================
// Trigger
// =============================================================================

/// When a form collaborator should run a rule interactively.
///
/// Purely informational: the engine runs every rule it is handed regardless
/// of trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// Run while the user edits the field.
    Change,
    /// Run when the field loses focus.
    Blur,
}

// =============================================================================
// ValueType
// =============================================================================

/// The `type` vocabulary understood by [`Constraint::Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Integer,
    Float,
    Boolean,
    Array,
    Object,
    Email,
    Url,
}

impl ValueType {
    /// Parses a `type` tag, returning `None` for tags outside the vocabulary.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            "email" => Some(Self::Email),
            "url" => Some(Self::Url),
            _ => None,
        }
    }

    /// Returns the tag this type is authored with.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Email => "email",
            Self::Url => "url",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Bounds
// =============================================================================

/// Length or value bounds.
///
/// Strings are measured in characters and arrays in elements; numbers are
/// compared by value. Other values are not bounded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    /// Inclusive lower bound.
    pub min: Option<f64>,
    /// Inclusive upper bound.
    pub max: Option<f64>,
    /// Exact length or value.
    pub len: Option<f64>,
}

impl Bounds {
    /// Creates bounds with no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inclusive lower bound.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets the inclusive upper bound.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Requires an exact length or value.
    pub fn len(mut self, len: f64) -> Self {
        self.len = Some(len);
        self
    }

    /// Returns `true` if no limit is set.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.len.is_none()
    }

    fn validate(&self, field: &str) -> Result<(), RuleError> {
        let negative = [self.min, self.max, self.len]
            .into_iter()
            .flatten()
            .any(|bound| bound < 0.0 || bound.is_nan());
        if negative {
            return Err(RuleError::InvalidBounds {
                field: field.to_string(),
                message: "bounds must be non-negative numbers".to_string(),
            });
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(RuleError::InvalidBounds {
                    field: field.to_string(),
                    message: format!("min {} is greater than max {}", min, max),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Custom validators
// =============================================================================

/// Result of a custom validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The value is acceptable.
    Pass,
    /// The value is rejected; the rule's own message is reported.
    Fail,
    /// The value is rejected with a validator-supplied message.
    FailWith(String),
}

/// Escape hatch for checks the built-in vocabulary cannot express.
///
/// Receives the field value and the whole record, so cross-field checks
/// (password confirmation) and async checks (availability lookups) both fit.
///
/// # Example
///
/// ```ignore
/// use dca_validation::{FieldValidator, Verdict};
///
/// struct UsernameAvailable { api: Api }
///
/// #[async_trait]
/// impl FieldValidator for UsernameAvailable {
///     async fn validate(&self, value: &Value, _record: &Map<String, Value>) -> Verdict {
///         match self.api.is_taken(value.as_str().unwrap_or_default()).await {
///             Ok(false) => Verdict::Pass,
///             Ok(true) => Verdict::Fail,
///             Err(e) => Verdict::FailWith(e.to_string()),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait FieldValidator: Send + Sync {
    /// Checks `value`, which belongs to `record`.
    async fn validate(&self, value: &Value, record: &Map<String, Value>) -> Verdict;
}

/// A [`FieldValidator`] backed by a synchronous closure.
pub struct FnValidator<F> {
    check: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Value, &Map<String, Value>) -> Verdict + Send + Sync,
{
    /// Wraps a closure as a validator.
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

#[async_trait]
impl<F> FieldValidator for FnValidator<F>
where
    F: Fn(&Value, &Map<String, Value>) -> Verdict + Send + Sync,
{
    async fn validate(&self, value: &Value, record: &Map<String, Value>) -> Verdict {
        (self.check)(value, record)
    }
}

// =============================================================================
// Constraint
// =============================================================================

/// The check a [`Rule`] performs beyond its `required` flag.
#[derive(Clone)]
pub enum Constraint {
    /// No check besides `required`.
    Presence,
    /// The value must have the given shape, then satisfy `bounds`.
    Type { ty: ValueType, bounds: Bounds },
    /// Length or value bounds without a type check.
    Bounds(Bounds),
    /// The value must be a string matched by the regex.
    ///
    /// Regexes built by [`Rule::pattern`] and [`Rule::from_spec`] are
    /// anchored, so the whole string has to match.
    Pattern(Regex),
    /// The value must equal one of the listed values.
    OneOf(Vec<Value>),
    /// Delegates to a custom validator.
    Custom(Arc<dyn FieldValidator>),
    /// Every part must pass; the rule still reports a single failure.
    All(Vec<Constraint>),
}

impl Constraint {
    fn set_bounds(&mut self, new_bounds: Bounds) {
        match self {
            Self::Type { bounds, .. } | Self::Bounds(bounds) => *bounds = new_bounds,
            Self::All(parts) => parts.iter_mut().for_each(|part| part.set_bounds(new_bounds)),
            _ => {}
        }
    }

    fn combine(mut parts: Vec<Constraint>) -> Self {
        match parts.len() {
            0 => Self::Presence,
            1 => parts.remove(0),
            _ => Self::All(parts),
        }
    }
}

/// Compiles `pattern` so that it only matches whole strings.
pub(crate) fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence => f.write_str("Presence"),
            Self::Type { ty, bounds } => f
                .debug_struct("Type")
                .field("ty", ty)
                .field("bounds", bounds)
                .finish(),
            Self::Bounds(bounds) => f.debug_tuple("Bounds").field(bounds).finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::All(parts) => f.debug_tuple("All").field(parts).finish(),
        }
    }
}

// =============================================================================
// Rule
// =============================================================================

/// One constraint on one field, with the message reported when it fails.
///
/// # Example
///
/// ```
/// use dca_validation::{Rule, Trigger, ValueType};
///
/// let email = Rule::of_type(ValueType::Email, "Please enter a valid email")
///     .and_required()
///     .on(Trigger::Blur);
/// let password = Rule::length(Some(6), Some(32), "6 to 32 characters");
/// ```
#[derive(Debug, Clone)]
pub struct Rule {
    /// Fail on null, empty string and empty array.
    pub required: bool,
    /// The check performed on non-empty values.
    pub constraint: Constraint,
    /// Message reported on failure.
    pub message: String,
    /// When the rule is meant to run interactively.
    pub trigger: Option<Trigger>,
}

impl Rule {
    fn with_constraint(constraint: Constraint, message: impl Into<String>) -> Self {
        Self {
            required: false,
            constraint,
            message: message.into(),
            trigger: None,
        }
    }

    /// A rule that only requires a non-empty value.
    pub fn required(message: impl Into<String>) -> Self {
        Self::with_constraint(Constraint::Presence, message).and_required()
    }

    /// A rule requiring the value to have the given type.
    pub fn of_type(ty: ValueType, message: impl Into<String>) -> Self {
        Self::with_constraint(
            Constraint::Type {
                ty,
                bounds: Bounds::new(),
            },
            message,
        )
    }

    /// A string rule bounding its length in characters.
    pub fn length(min: Option<usize>, max: Option<usize>, message: impl Into<String>) -> Self {
        let bounds = Bounds {
            min: min.map(|n| n as f64),
            max: max.map(|n| n as f64),
            len: None,
        };
        Self::with_constraint(
            Constraint::Type {
                ty: ValueType::String,
                bounds,
            },
            message,
        )
    }

    /// A numeric rule bounding the value.
    pub fn range(min: Option<f64>, max: Option<f64>, message: impl Into<String>) -> Self {
        let bounds = Bounds { min, max, len: None };
        Self::with_constraint(
            Constraint::Type {
                ty: ValueType::Number,
                bounds,
            },
            message,
        )
    }

    /// A rule requiring `pattern` to match the whole string.
    ///
    /// `\d{6}|\d{11}` accepts six or eleven digits and nothing else.
    pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self::with_constraint(
            Constraint::Pattern(anchored(pattern)?),
            message,
        ))
    }

    /// A rule requiring one of the given values.
    pub fn one_of(values: Vec<Value>, message: impl Into<String>) -> Self {
        Self::with_constraint(Constraint::OneOf(values), message)
    }

    /// A rule delegating to a custom validator.
    pub fn custom<V>(validator: V, message: impl Into<String>) -> Self
    where
        V: FieldValidator + 'static,
    {
        Self::with_constraint(Constraint::Custom(Arc::new(validator)), message)
    }

    /// A rule delegating to a synchronous closure.
    ///
    /// ```
    /// use dca_validation::{Rule, Verdict};
    ///
    /// let confirm = Rule::custom_fn("Passwords do not match", |value, record| {
    ///     if Some(value) == record.get("password") {
    ///         Verdict::Pass
    ///     } else {
    ///         Verdict::Fail
    ///     }
    /// });
    /// ```
    pub fn custom_fn<F>(message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value, &Map<String, Value>) -> Verdict + Send + Sync + 'static,
    {
        Self::custom(FnValidator::new(check), message)
    }

    /// Marks the rule as required.
    pub fn and_required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Replaces the bounds of a type or bounds rule.
    ///
    /// Other constraints are left untouched.
    pub fn with_bounds(mut self, new_bounds: Bounds) -> Self {
        self.constraint.set_bounds(new_bounds);
        self
    }

    /// Sets the trigger.
    pub fn on(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Returns `true` if the rule is meant to run on `trigger`.
    ///
    /// Rules without a trigger run on every event.
    pub fn fires_on(&self, trigger: Trigger) -> bool {
        self.trigger.is_none_or(|t| t == trigger)
    }

    /// Returns the name of the check this rule performs.
    pub fn rule_name(&self) -> &'static str {
        match &self.constraint {
            Constraint::Presence => "required",
            Constraint::Type { ty, .. } => ty.as_str(),
            Constraint::Bounds(_) => "bounds",
            Constraint::Pattern(_) => "pattern",
            Constraint::OneOf(_) => "enum",
            Constraint::Custom(_) => "custom",
            Constraint::All(_) => "combined",
        }
    }

    /// Builds a rule from its loose authoring shape.
    ///
    /// Fails on anything a form author could not have meant: unknown types,
    /// invalid regexes, inverted bounds or a missing message. Attributes
    /// that combine (`type` with `min`, `pattern` and `enum`) become one
    /// rule whose parts are checked in that order.
    pub fn from_spec(field: &str, spec: RuleSpec) -> Result<Self, RuleError> {
        let message = spec.message.ok_or_else(|| RuleError::MissingMessage {
            field: field.to_string(),
        })?;

        let bounds = Bounds {
            min: spec.min,
            max: spec.max,
            len: spec.len,
        };
        bounds.validate(field)?;

        let ty = match spec.ty.as_deref() {
            Some(tag) => Some(ValueType::from_tag(tag).ok_or_else(|| RuleError::UnknownType {
                field: field.to_string(),
                ty: tag.to_string(),
            })?),
            None => None,
        };

        let mut parts = Vec::new();
        match ty {
            Some(ty) => parts.push(Constraint::Type { ty, bounds }),
            None if !bounds.is_unbounded() => parts.push(Constraint::Bounds(bounds)),
            None => {}
        }
        if let Some(pattern) = spec.pattern {
            let regex = anchored(&pattern).map_err(|e| RuleError::InvalidPattern {
                field: field.to_string(),
                message: e.to_string(),
            })?;
            parts.push(Constraint::Pattern(regex));
        }
        if let Some(values) = spec.one_of {
            parts.push(Constraint::OneOf(values));
        }
        let constraint = Constraint::combine(parts);

        Ok(Self {
            required: spec.required,
            constraint,
            message,
            trigger: spec.trigger,
        })
    }
}

// =============================================================================
// RuleSpec
// =============================================================================

/// The loose JSON shape rules are authored in.
///
/// ```json
/// { "required": true, "type": "string", "min": 6, "message": "Too short", "trigger": "blur" }
/// ```
///
/// Keys outside the vocabulary are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSpec {
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub len: Option<f64>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(rename = "enum", default)]
    pub one_of: Option<Vec<Value>>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub trigger: Option<Trigger>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> RuleSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_from_spec_required_only() {
        let spec = spec(json!({"required": true, "message": "Required"}));
        let rule = Rule::from_spec("name", spec).unwrap();
        assert!(rule.required);
        assert!(matches!(rule.constraint, Constraint::Presence));
        assert_eq!(rule.rule_name(), "required");
    }

    #[test]
    fn test_from_spec_type_with_bounds() {
        let rule = Rule::from_spec(
            "password",
            spec(json!({
                "type": "string",
                "min": 6,
                "max": 20,
                "message": "6-20",
                "trigger": "blur"
            })),
        )
        .unwrap();
        match rule.constraint {
            Constraint::Type { ty, bounds } => {
                assert_eq!(ty, ValueType::String);
                assert_eq!(bounds.min, Some(6.0));
                assert_eq!(bounds.max, Some(20.0));
            }
            other => panic!("unexpected constraint {:?}", other),
        }
        assert_eq!(rule.trigger, Some(Trigger::Blur));
    }

    #[test]
    fn test_from_spec_bare_bounds() {
        let rule = Rule::from_spec("code", spec(json!({"len": 6, "message": "6 digits"}))).unwrap();
        assert!(matches!(rule.constraint, Constraint::Bounds(b) if b.len == Some(6.0)));
    }

    #[test]
    fn test_from_spec_unknown_type_fails() {
        let err = Rule::from_spec("x", spec(json!({"type": "uuid", "message": "m"}))).unwrap_err();
        assert!(matches!(err, RuleError::UnknownType { ref ty, .. } if ty == "uuid"));
        assert_eq!(err.field(), Some("x"));
    }

    #[test]
    fn test_from_spec_invalid_pattern_fails() {
        let err =
            Rule::from_spec("x", spec(json!({"pattern": "([a-z", "message": "m"}))).unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }

    #[test]
    fn test_from_spec_inverted_bounds_fails() {
        let err =
            Rule::from_spec("x", spec(json!({"min": 5, "max": 2, "message": "m"}))).unwrap_err();
        assert!(matches!(err, RuleError::InvalidBounds { .. }));
    }

    #[test]
    fn test_from_spec_missing_message_fails() {
        let err = Rule::from_spec("x", spec(json!({"required": true}))).unwrap_err();
        assert!(matches!(err, RuleError::MissingMessage { .. }));
    }

    #[test]
    fn test_from_spec_pattern_only() {
        let rule = Rule::from_spec(
            "phone",
            spec(json!({"pattern": "^1\\d{10}$", "message": "Invalid phone"})),
        )
        .unwrap();
        assert_eq!(rule.rule_name(), "pattern");
        assert!(matches!(
            rule.constraint,
            Constraint::Pattern(ref re) if re.as_str() == "^(?:^1\\d{10}$)$"
        ));
    }

    #[test]
    fn test_from_spec_combines_attributes_in_order() {
        let rule = Rule::from_spec(
            "pw",
            spec(json!({
                "type": "string",
                "min": 6,
                "pattern": "^[a-z0-9]+$",
                "enum": ["secret1", "secret2"],
                "message": "Bad password"
            })),
        )
        .unwrap();
        assert_eq!(rule.rule_name(), "combined");
        match rule.constraint {
            Constraint::All(parts) => {
                assert_eq!(parts.len(), 3);
                assert!(matches!(parts[0], Constraint::Type { ty: ValueType::String, .. }));
                assert!(matches!(parts[1], Constraint::Pattern(_)));
                assert!(matches!(parts[2], Constraint::OneOf(_)));
            }
            other => panic!("unexpected constraint {:?}", other),
        }
    }

    #[test]
    fn test_from_spec_pattern_with_bare_bounds() {
        let spec = spec(json!({"pattern": "[a-z]+", "max": 3, "message": "m"}));
        let rule = Rule::from_spec("x", spec).unwrap();
        match rule.constraint {
            Constraint::All(parts) => {
                assert!(matches!(parts[0], Constraint::Bounds(b) if b.max == Some(3.0)));
                assert!(matches!(parts[1], Constraint::Pattern(_)));
            }
            other => panic!("unexpected constraint {:?}", other),
        }
    }

    #[test]
    fn test_fires_on() {
        let any = Rule::required("m");
        let blur = Rule::required("m").on(Trigger::Blur);
        assert!(any.fires_on(Trigger::Change));
        assert!(blur.fires_on(Trigger::Blur));
        assert!(!blur.fires_on(Trigger::Change));
    }

    #[test]
    fn test_with_bounds_only_touches_bounded_constraints() {
        let rule = Rule::of_type(ValueType::Array, "m").with_bounds(Bounds::new().min(1.0));
        assert!(matches!(
            rule.constraint,
            Constraint::Type { bounds, .. } if bounds.min == Some(1.0)
        ));

        let rule = Rule::required("m").with_bounds(Bounds::new().min(1.0));
        assert!(matches!(rule.constraint, Constraint::Presence));
    }
}
