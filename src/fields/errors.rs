//! Field catalog and path errors

use thiserror::Error;

/// Result type for field operations
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors raised while parsing field paths or building a catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Field path is empty")]
    EmptyPath,

    #[error("Field path '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Invalid field template '{name}': {reason}")]
    InvalidTemplate { name: String, reason: String },

    #[error("Failed to load field templates from '{path}': {reason}")]
    Load { path: String, reason: String },
}

impl FieldError {
    /// Template error helper
    pub fn invalid_template(name: impl Into<String>, reason: impl Into<String>) -> Self {
        FieldError::InvalidTemplate {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
