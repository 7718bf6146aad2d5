//! Schema Validator subsystem for faultgate
//!
//! Wire-format schemas are JSON Schema documents (draft-04 compatible).
//!
//! # Design Principles
//!
//! - Compile once, validate many times
//! - Malformed schemas fail at startup (FATAL)
//! - Validation reports every violation, never only the first
//! - No coercion: numbers encoded as strings are type errors
//! - Deterministic violation order

mod compiler;
mod definition;
mod errors;
mod types;
mod validator;

pub use definition::{EventSchema, SchemaDefinition};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity, Violation};
pub use types::JsonType;
pub use validator::SchemaValidator;
