//! Payload decoding errors

use thiserror::Error;

/// Result type for payload operations
pub type PayloadResult<T> = Result<T, PayloadError>;

/// Errors raised while decoding or editing payloads
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Payload is not well-formed JSON: {0}")]
    Malformed(String),

    #[error("Line {line} is not well-formed JSON: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Expected a JSON object at {location}, got {actual}")]
    NotAnObject { location: String, actual: String },

    #[error("Payload contains no events")]
    Empty,

    #[error("Cannot place a value at '{path}': {reason}")]
    Unreachable { path: String, reason: String },

    #[error("Failed to read '{path}': {reason}")]
    Io { path: String, reason: String },
}
