//! Presence policy errors

use thiserror::Error;

use super::evaluator::RuleViolation;
use crate::schema::Violation;

/// Result type for policy operations
pub type PolicyResult<T> = Result<T, PolicyError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Invalid presence rule for '{field}': {reason}")]
    InvalidRule { field: String, reason: String },

    #[error("Failed to load presence rules: {0}")]
    Load(String),

    /// The document breaks one or more rules
    #[error("Presence policy violated: {}", summarize(.0))]
    Violated(Vec<RuleViolation>),

    /// The probe sample does not pass the schema on its own
    #[error("Probe sample is invalid: {} violation(s)", .0.len())]
    SampleRejected(Vec<Violation>),

    #[error("Cannot prepare '{field}' in the probe sample: {reason}")]
    Unplaceable { field: String, reason: String },
}

fn summarize(violations: &[RuleViolation]) -> String {
    let rendered: Vec<String> = violations.iter().map(ToString::to_string).collect();
    rendered.join("; ")
}
