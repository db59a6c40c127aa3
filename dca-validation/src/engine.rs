//! Record validation entry points

use futures::future::join_all;
use serde_json::Map;
use serde_json::Value;

use crate::error::RuleError;
use crate::outcome::FieldReport;
use crate::outcome::Outcome;
use crate::outcome::ValidationFailure;
use crate::rule_set::RuleSet;

/// Validates every field present in `record` against its rules.
///
/// - A `record` that is not a JSON object yields [`Outcome::NotApplicable`].
/// - Fields declared in `rules` but absent from `record` are not checked,
///   even when `required`.
/// - All rules of all present fields run concurrently and are all awaited;
///   nothing short-circuits.
/// - Failures are ordered by field declaration, then rule index.
///
/// # Example
///
/// ```ignore
/// let outcome = validate_all(&json!({"email": ""}), &rules).await;
/// match outcome {
///     Outcome::Invalid(failures) => show(failures),
///     Outcome::Valid => submit(),
///     Outcome::NotApplicable => {}
/// }
/// ```
pub async fn validate_all(record: &Value, rules: &RuleSet) -> Outcome {
    match record.as_object() {
        Some(record) => validate_record(record, rules).await,
        None => Outcome::NotApplicable,
    }
}

/// Like [`validate_all`], taking the rule set in its JSON authoring shape.
///
/// A null rule set yields [`Outcome::NotApplicable`]; a malformed one is a
/// [`RuleError`].
pub async fn validate_json(record: &Value, rules: &Value) -> Result<Outcome, RuleError> {
    if rules.is_null() {
        return Ok(Outcome::NotApplicable);
    }
    let rules = RuleSet::from_json(rules)?;
    Ok(validate_all(record, &rules).await)
}

/// Validates `record` and keeps one message per failing field.
///
/// When a field fails several rules, the message of the first declared
/// failing rule is kept.
pub async fn get_invalid_fields(record: &Value, rules: &RuleSet) -> FieldReport {
    validate_all(record, rules).await.into_report()
}

/// Validates a single field value, as on blur.
///
/// Runs only `field`'s rules against the record `{field: value}` and returns
/// the first failing rule's message.
pub async fn validate_field(field: &str, value: &Value, rules: &RuleSet) -> Option<String> {
    let mut record = Map::new();
    record.insert(field.to_string(), value.clone());

    let field_rules = RuleSet::new().field_rules(field, rules.rules_for(field).iter().cloned());
    validate_record(&record, &field_rules)
        .await
        .failures()
        .first()
        .map(|failure| failure.message.clone())
}

async fn validate_record(record: &Map<String, Value>, rules: &RuleSet) -> Outcome {
    let mut checks = Vec::new();
    for (field, field_rules) in rules.iter() {
        let Some(value) = record.get(field) else {
            continue;
        };
        for rule in field_rules {
            checks.push(async move {
                rule.evaluate(value, record)
                    .await
                    .map(|message| ValidationFailure::new(field, message))
            });
        }
    }

    let results = join_all(checks).await;
    log::trace!(
        "validated {} rule(s) across {} field(s)",
        results.len(),
        rules.len()
    );

    Outcome::from_failures(results.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use crate::rule::ValueType;
    use crate::rule::Verdict;
    use serde_json::json;

    fn login_rules() -> RuleSet {
        RuleSet::new()
            .field("email", Rule::required("Email is required"))
            .field("email", Rule::of_type(ValueType::Email, "Invalid email"))
            .field("password", Rule::required("Password is required"))
            .field("password", Rule::length(Some(6), None, "At least 6 characters"))
    }

    #[tokio::test]
    async fn test_non_object_record_is_not_applicable() {
        let rules = login_rules();
        assert_eq!(validate_all(&Value::Null, &rules).await, Outcome::NotApplicable);
        assert_eq!(validate_all(&json!("x"), &rules).await, Outcome::NotApplicable);
        assert_eq!(
            get_invalid_fields(&json!([1, 2]), &rules).await,
            FieldReport::NotApplicable
        );
    }

    #[tokio::test]
    async fn test_null_rule_json_is_not_applicable() {
        let outcome = validate_json(&json!({"a": 1}), &Value::Null).await.unwrap();
        assert!(outcome.is_not_applicable());
    }

    #[tokio::test]
    async fn test_malformed_rule_json_is_error() {
        let rules = json!({"a": [{"type": "nope", "message": "m"}]});
        let result = validate_json(&json!({"a": 1}), &rules).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_absent_fields_are_not_checked() {
        let outcome = validate_all(&json!({"email": "a@b.co"}), &login_rules()).await;
        assert_eq!(outcome, Outcome::Valid);
    }

    #[tokio::test]
    async fn test_all_failures_collected_in_declaration_order() {
        let outcome = validate_all(&json!({"password": "", "email": "bad"}), &login_rules()).await;
        assert_eq!(
            outcome,
            Outcome::Invalid(vec![
                ValidationFailure::new("email", "Invalid email"),
                ValidationFailure::new("password", "Password is required"),
            ])
        );
    }

    #[tokio::test]
    async fn test_multiple_failures_on_one_field_are_not_deduped() {
        let rules = RuleSet::new()
            .field("code", Rule::length(Some(6), None, "Too short"))
            .field("code", Rule::pattern(r"\d+", "Digits only").unwrap());
        let outcome = validate_all(&json!({"code": "ab"}), &rules).await;
        assert_eq!(outcome.failures().len(), 2);
    }

    #[tokio::test]
    async fn test_custom_validator_sees_whole_record() {
        let rules = RuleSet::new().field(
            "confirm",
            Rule::custom_fn("Passwords do not match", |value, record| {
                if record.get("password") == Some(value) {
                    Verdict::Pass
                } else {
                    Verdict::Fail
                }
            }),
        );
        let record = json!({"password": "abc123", "confirm": "abc124"});
        let bad = get_invalid_fields(&record, &rules).await;
        assert_eq!(bad.message_for("confirm"), Some("Passwords do not match"));
        let record = json!({"password": "abc123", "confirm": "abc123"});
        let good = get_invalid_fields(&record, &rules).await;
        assert!(good.is_valid());
    }

    #[tokio::test]
    async fn test_validate_field_returns_first_message() {
        let rules = login_rules();
        assert_eq!(
            validate_field("password", &json!(""), &rules).await.as_deref(),
            Some("Password is required")
        );
        assert_eq!(
            validate_field("password", &json!("abc"), &rules).await.as_deref(),
            Some("At least 6 characters")
        );
        assert_eq!(validate_field("password", &json!("abcdef"), &rules).await, None);
        assert_eq!(validate_field("nickname", &json!(""), &rules).await, None);
    }
}
