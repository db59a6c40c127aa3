//! Rule definition errors

/// Errors raised while building a rule set from its loose JSON shape.
///
/// These are programmer errors in a form's rule table, not user input
/// failures. User input failures are reported as data through
/// [`Outcome`](crate::Outcome).
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuleError {
    /// The `type` tag is not part of the rule vocabulary.
    #[error("Unknown rule type '{ty}' on field '{field}'")]
    UnknownType { field: String, ty: String },

    /// The `pattern` could not be compiled.
    #[error("Invalid pattern on field '{field}': {message}")]
    InvalidPattern { field: String, message: String },

    /// `min`, `max` or `len` is negative or `min > max`.
    #[error("Invalid bounds on field '{field}': {message}")]
    InvalidBounds { field: String, message: String },

    /// The rule has no `message` to report on failure.
    #[error("Rule on field '{field}' has no message")]
    MissingMessage { field: String },

    /// The rule set (or a field's rule list) has the wrong JSON shape.
    #[error("Malformed rule set: {0}")]
    Malformed(String),
}

impl RuleError {
    /// Creates a new malformed rule set error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Returns the field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::UnknownType { field, .. }
            | Self::InvalidPattern { field, .. }
            | Self::InvalidBounds { field, .. }
            | Self::MissingMessage { field } => Some(field),
            Self::Malformed(_) => None,
        }
    }
}
