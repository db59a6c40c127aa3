//! Per-field rule tables

use serde_json::Value;

use crate::error::RuleError;
use crate::rule::Rule;
use crate::rule::RuleSpec;

/// Rules keyed by field name, in declaration order.
///
/// Field order is the order fields were first declared in; it decides the
/// order failures are reported in.
///
/// # Example
///
/// ```
/// use dca_validation::{Rule, RuleSet, ValueType};
///
/// let rules = RuleSet::new()
///     .field("email", Rule::of_type(ValueType::Email, "Invalid email").and_required())
///     .field("password", Rule::required("Password is required"))
///     .field("password", Rule::length(Some(6), None, "At least 6 characters"));
///
/// assert_eq!(rules.len(), 2);
/// assert_eq!(rules.rules_for("password").len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<(String, Vec<Rule>)>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule to a field's list.
    pub fn field(mut self, field: impl Into<String>, rule: Rule) -> Self {
        self.push(field, rule);
        self
    }

    /// Appends several rules to a field's list.
    pub fn field_rules(
        mut self,
        field: impl Into<String>,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Self {
        let field = field.into();
        for rule in rules {
            self.push(field.clone(), rule);
        }
        self
    }

    /// Appends a rule to a field's list in place.
    pub fn push(&mut self, field: impl Into<String>, rule: Rule) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, rules)) => rules.push(rule),
            None => self.fields.push((field, vec![rule])),
        }
    }

    /// Returns the rules declared for `field`, in declaration order.
    pub fn rules_for(&self, field: &str) -> &[Rule] {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, rules)| rules.as_slice())
            .unwrap_or(&[])
    }

    /// Iterates over fields and their rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.fields
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }

    /// Returns the declared field names in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the number of fields with rules.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field has rules.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds a rule set from its JSON authoring shape.
    ///
    /// The input must be an object mapping field names to arrays of rule
    /// objects (see [`RuleSpec`]). A single rule object is accepted in place
    /// of a one-element array. Object key order becomes field order.
    pub fn from_json(value: &Value) -> Result<Self, RuleError> {
        let object = value
            .as_object()
            .ok_or_else(|| RuleError::malformed("rule set must be an object"))?;

        let mut set = Self::new();
        for (field, rules) in object {
            let specs: Vec<&Value> = match rules {
                Value::Array(items) => items.iter().collect(),
                Value::Object(_) => vec![rules],
                _ => {
                    return Err(RuleError::malformed(format!(
                        "rules for '{}' must be an array of objects",
                        field
                    )));
                }
            };
            if specs.is_empty() {
                // Keep the declaration so field order is stable.
                set.fields.push((field.clone(), Vec::new()));
                continue;
            }
            for spec in specs {
                let spec: RuleSpec = serde_json::from_value(spec.clone()).map_err(|e| {
                    RuleError::malformed(format!("rule for '{}': {}", field, e))
                })?;
                set.push(field.clone(), Rule::from_spec(field, spec)?);
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_groups_by_field_in_declaration_order() {
        let rules = RuleSet::new()
            .field("b", Rule::required("b1"))
            .field("a", Rule::required("a1"))
            .field("b", Rule::required("b2"));

        let fields: Vec<&str> = rules.fields().collect();
        assert_eq!(fields, vec!["b", "a"]);
        let messages: Vec<&str> = rules.rules_for("b").iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["b1", "b2"]);
        assert!(rules.rules_for("missing").is_empty());
    }

    #[test]
    fn test_from_json() {
        let rules = RuleSet::from_json(&json!({
            "email": [
                {"required": true, "message": "Email is required", "trigger": "blur"},
                {"type": "email", "message": "Invalid email", "trigger": "hover"}
            ]
        }));
        assert!(matches!(rules, Err(RuleError::Malformed(_))));

        let rules = RuleSet::from_json(&json!({
            "email": [
                {"required": true, "message": "Email is required", "trigger": "blur"},
                {"type": "email", "message": "Invalid email", "trigger": "change"}
            ],
            "code": {"len": 6, "message": "Six digits"}
        }))
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules_for("email").len(), 2);
        assert_eq!(rules.rules_for("code")[0].rule_name(), "bounds");
    }

    #[test]
    fn test_from_json_rejects_wrong_shapes() {
        assert!(RuleSet::from_json(&json!(null)).is_err());
        assert!(RuleSet::from_json(&json!(["a"])).is_err());
        assert!(RuleSet::from_json(&json!({"a": "required"})).is_err());
        assert!(matches!(
            RuleSet::from_json(&json!({"a": [{"type": "money", "message": "m"}]})),
            Err(RuleError::UnknownType { .. })
        ));
    }
}
