//! Processor errors
//!
//! Every `ProcessError` rejects one request and nothing else. `SetupError`
//! happens while the processor table is built and aborts startup.

use thiserror::Error;

use crate::payload::PayloadError;
use crate::policy::{PolicyError, RuleViolation};
use crate::schema::{SchemaError, Violation};

/// Result type for request processing
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Per-request rejection
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Bytes are not a well-formed document
    #[error("Document rejected: {0}")]
    DocumentParse(#[from] PayloadError),

    /// Syntactic schema failure
    #[error("Event {index} failed '{processor}' schema validation with {} violation(s)", .violations.len())]
    Validation {
        processor: String,
        index: usize,
        violations: Vec<Violation>,
    },

    /// Semantic presence policy failure
    #[error("Event {index} violates '{processor}' presence policy with {} violation(s)", .violations.len())]
    Policy {
        processor: String,
        index: usize,
        violations: Vec<RuleViolation>,
    },

    #[error("Transform failed for event {index}: {reason}")]
    Transform { index: usize, reason: String },

    #[error("No processor registered for route '{0}'")]
    UnknownRoute(String),
}

impl ProcessError {
    /// Short category used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::DocumentParse(_) => "parse",
            ProcessError::Validation { .. } => "schema",
            ProcessError::Policy { .. } => "policy",
            ProcessError::Transform { .. } => "transform",
            ProcessError::UnknownRoute(_) => "route",
        }
    }
}

/// Failure while building processors (FATAL)
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Invalid presence rules: {0}")]
    Rules(#[from] PolicyError),

    #[error("Route '{0}' is registered twice")]
    DuplicateRoute(String),
}
