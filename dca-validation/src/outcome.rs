//! Validation results

use std::fmt;

use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    /// The field the rule belongs to.
    pub field: String,
    /// The rule's message.
    pub message: String,
}

impl ValidationFailure {
    /// Creates a new failure.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of validating a whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was validated: the record was not an object, or there was no
    /// rule set. Not a pass.
    NotApplicable,
    /// Every checked rule passed.
    Valid,
    /// At least one rule failed. Never empty; ordered by field declaration,
    /// then rule index.
    Invalid(Vec<ValidationFailure>),
}

impl Outcome {
    pub(crate) fn from_failures(failures: Vec<ValidationFailure>) -> Self {
        if failures.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(failures)
        }
    }

    /// Returns `true` only if validation ran and found nothing.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns `true` if validation ran and found failures.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Returns `true` if validation did not run.
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Self::NotApplicable)
    }

    /// Returns the failures, empty unless invalid.
    pub fn failures(&self) -> &[ValidationFailure] {
        match self {
            Self::Invalid(failures) => failures,
            _ => &[],
        }
    }

    /// Collapses the failures into one message per field.
    pub fn into_report(self) -> FieldReport {
        match self {
            Self::NotApplicable => FieldReport::NotApplicable,
            Self::Valid => FieldReport::Valid,
            Self::Invalid(failures) => FieldReport::Invalid(InvalidFields::from_failures(failures)),
        }
    }
}

/// One message per failing field, in field declaration order.
///
/// Serializes as a JSON object `{field: message}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidFields {
    entries: Vec<(String, String)>,
}

impl InvalidFields {
    /// Collapses failures, keeping the first message seen for each field.
    pub fn from_failures(failures: impl IntoIterator<Item = ValidationFailure>) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for failure in failures {
            if !entries.iter().any(|(field, _)| *field == failure.field) {
                entries.push((failure.field, failure.message));
            }
        }
        Self { entries }
    }

    /// Returns the message for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, message)| message.as_str())
    }

    /// Returns `true` if `field` failed.
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Iterates over `(field, message)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// Returns the failing field names.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(field, _)| field.as_str())
    }

    /// Returns the number of failing fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no field failed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for InvalidFields {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, message) in &self.entries {
            map.serialize_entry(field, message)?;
        }
        map.end()
    }
}

/// Result of [`get_invalid_fields`](crate::get_invalid_fields).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldReport {
    /// Nothing was validated.
    NotApplicable,
    /// Every checked rule passed.
    Valid,
    /// One message per failing field.
    Invalid(InvalidFields),
}

impl FieldReport {
    /// Returns `true` only if validation ran and found nothing.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the failing fields, if any.
    pub fn invalid_fields(&self) -> Option<&InvalidFields> {
        match self {
            Self::Invalid(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns the message for `field`, if it failed.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.invalid_fields().and_then(|fields| fields.get(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_failures_empty_is_valid() {
        assert_eq!(Outcome::from_failures(Vec::new()), Outcome::Valid);
    }

    #[test]
    fn test_invalid_fields_keeps_first_message() {
        let fields = InvalidFields::from_failures(vec![
            ValidationFailure::new("password", "Required"),
            ValidationFailure::new("email", "Invalid email"),
            ValidationFailure::new("password", "Too short"),
        ]);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("password"), Some("Required"));
        let order: Vec<&str> = fields.fields().collect();
        assert_eq!(order, vec!["password", "email"]);
    }

    #[test]
    fn test_invalid_fields_serializes_as_object() {
        let fields =
            InvalidFields::from_failures(vec![ValidationFailure::new("email", "Invalid email")]);
        assert_eq!(
            serde_json::to_string(&fields).unwrap(),
            r#"{"email":"Invalid email"}"#
        );
    }

    #[test]
    fn test_into_report_preserves_not_applicable() {
        assert_eq!(Outcome::NotApplicable.into_report(), FieldReport::NotApplicable);
        assert!(Outcome::Valid.into_report().is_valid());
    }
}
