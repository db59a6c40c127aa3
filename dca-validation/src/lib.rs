//! Declarative form validation
//!
//! Rules are declared per field, either in code or in a loose JSON shape,
//! and a whole record is checked in one call. Every rule of every present
//! field runs; failures come back as data, never as errors.

pub mod error;
pub mod outcome;
pub mod rule;
pub mod rule_set;

mod check;
mod engine;

pub use engine::*;
pub use error::RuleError;
pub use outcome::FieldReport;
pub use outcome::InvalidFields;
pub use outcome::Outcome;
pub use outcome::ValidationFailure;
pub use rule::Bounds;
pub use rule::Constraint;
pub use rule::FieldValidator;
pub use rule::FnValidator;
pub use rule::Rule;
pub use rule::RuleSpec;
pub use rule::Trigger;
pub use rule::ValueType;
pub use rule::Verdict;
pub use rule_set::RuleSet;
