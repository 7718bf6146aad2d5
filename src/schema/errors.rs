//! Schema error types
//!
//! Error codes:
//! - GATE_SCHEMA_MALFORMED (FATAL)
//! - GATE_SCHEMA_MISSING_KEYWORD (FATAL)
//! - GATE_SCHEMA_INVALID_KEYWORD (FATAL)
//! - GATE_SCHEMA_INVALID_PATTERN (FATAL)
//! - GATE_SCHEMA_UNRESOLVED_REF (FATAL)
//! - GATE_SCHEMA_CYCLIC_REF (FATAL)
//! - GATE_SCHEMA_VALIDATION_FAILED (REJECT)

use serde::Serialize;
use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The offending payload is rejected, processing continues
    Reject,
    /// Initialization must abort
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Source is not JSON or a schema node is not an object
    GateSchemaMalformed,
    /// A keyword the compiler needs is absent
    GateSchemaMissingKeyword,
    /// A keyword has the wrong shape
    GateSchemaInvalidKeyword,
    /// `pattern` or a `patternProperties` key is not a valid regex
    GateSchemaInvalidPattern,
    /// `$ref` points outside the document or at nothing
    GateSchemaUnresolvedRef,
    /// References loop without reaching a concrete schema
    GateSchemaCyclicRef,
    /// Document violates schema
    GateSchemaValidationFailed,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::GateSchemaMalformed => "GATE_SCHEMA_MALFORMED",
            SchemaErrorCode::GateSchemaMissingKeyword => "GATE_SCHEMA_MISSING_KEYWORD",
            SchemaErrorCode::GateSchemaInvalidKeyword => "GATE_SCHEMA_INVALID_KEYWORD",
            SchemaErrorCode::GateSchemaInvalidPattern => "GATE_SCHEMA_INVALID_PATTERN",
            SchemaErrorCode::GateSchemaUnresolvedRef => "GATE_SCHEMA_UNRESOLVED_REF",
            SchemaErrorCode::GateSchemaCyclicRef => "GATE_SCHEMA_CYCLIC_REF",
            SchemaErrorCode::GateSchemaValidationFailed => "GATE_SCHEMA_VALIDATION_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::GateSchemaValidationFailed => Severity::Reject,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single schema violation found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted instance path (e.g. "error.context.user.id", "frames[2].lineno")
    pub pointer: String,
    /// JSON pointer of the failing keyword inside the schema
    pub schema_path: String,
    /// Human-readable description
    pub message: String,
}

impl Violation {
    pub fn new(
        pointer: impl Into<String>,
        schema_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            pointer: pointer.into(),
            schema_path: schema_path.into(),
            message: message.into(),
        }
    }

    pub fn type_mismatch(pointer: &str, schema_path: String, expected: &str, actual: &str) -> Self {
        Self::new(pointer, schema_path, format!("expected {}, got {}", expected, actual))
    }

    pub fn missing_property(pointer: String, schema_path: String) -> Self {
        Self::new(pointer, schema_path, "required property is missing")
    }

    pub fn additional_property(pointer: String, schema_path: String) -> Self {
        Self::new(pointer, schema_path, "property is not allowed")
    }

    /// The keyword that failed, i.e. the last schema path segment.
    pub fn keyword(&self) -> &str {
        self.schema_path.rsplit('/').next().unwrap_or_default()
    }

    /// Returns true if the violation is located at `pointer` or below it.
    pub fn is_at_or_below(&self, pointer: &str) -> bool {
        match self.pointer.strip_prefix(pointer) {
            Some("") => true,
            Some(rest) => rest.starts_with('.') || rest.starts_with('['),
            None => false,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pointer = if self.pointer.is_empty() { "$root" } else { &self.pointer };
        write!(f, "'{}': {} (schema {})", pointer, self.message, self.schema_path)
    }
}

/// Schema error type with full context
#[derive(Debug)]
pub struct SchemaError {
    /// Error code
    code: SchemaErrorCode,
    /// Human-readable message
    message: String,
    /// Schema name if known
    schema_name: Option<String>,
    /// Location inside the schema source for compile errors
    location: Option<String>,
    /// Violations for validation failures
    violations: Vec<Violation>,
}

impl SchemaError {
    fn compile(
        code: SchemaErrorCode,
        schema_name: &str,
        location: &str,
        message: String,
    ) -> Self {
        Self {
            code,
            message,
            schema_name: Some(schema_name.to_string()),
            location: Some(display_location(location).to_string()),
            violations: Vec::new(),
        }
    }

    /// Source text or a node is not usable as a schema
    pub fn malformed(schema_name: &str, location: &str, reason: impl Into<String>) -> Self {
        Self::compile(
            SchemaErrorCode::GateSchemaMalformed,
            schema_name,
            location,
            format!("Malformed schema at '{}': {}", display_location(location), reason.into()),
        )
    }

    pub fn missing_keyword(schema_name: &str, location: &str, keyword: &str) -> Self {
        Self::compile(
            SchemaErrorCode::GateSchemaMissingKeyword,
            schema_name,
            location,
            format!("Schema at '{}' must declare '{}'", display_location(location), keyword),
        )
    }

    pub fn invalid_keyword(
        schema_name: &str,
        location: &str,
        keyword: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::compile(
            SchemaErrorCode::GateSchemaInvalidKeyword,
            schema_name,
            location,
            format!(
                "Invalid '{}' at '{}': {}",
                keyword,
                display_location(location),
                reason.into()
            ),
        )
    }

    pub fn invalid_pattern(
        schema_name: &str,
        location: &str,
        pattern: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::compile(
            SchemaErrorCode::GateSchemaInvalidPattern,
            schema_name,
            location,
            format!("Invalid pattern '{}': {}", pattern, reason.into()),
        )
    }

    pub fn unresolved_ref(schema_name: &str, location: &str, reference: &str) -> Self {
        Self::compile(
            SchemaErrorCode::GateSchemaUnresolvedRef,
            schema_name,
            location,
            format!(
                "Reference '{}' at '{}' cannot be resolved",
                reference,
                display_location(location)
            ),
        )
    }

    pub fn cyclic_ref(schema_name: &str, chain: &[String]) -> Self {
        let rendered: Vec<&str> = chain.iter().map(|loc| display_location(loc)).collect();
        Self::compile(
            SchemaErrorCode::GateSchemaCyclicRef,
            schema_name,
            chain.first().map(String::as_str).unwrap_or_default(),
            format!("Cyclic reference: {}", rendered.join(" -> ")),
        )
    }

    /// Document failed validation
    pub fn validation_failed(schema_name: &str, violations: Vec<Violation>) -> Self {
        let summary = match violations.first() {
            Some(first) if violations.len() == 1 => first.to_string(),
            Some(first) => format!("{} (and {} more)", first, violations.len() - 1),
            None => "no details".to_string(),
        };
        Self {
            code: SchemaErrorCode::GateSchemaValidationFailed,
            message: format!("Document validation failed: {}", summary),
            schema_name: Some(schema_name.to_string()),
            location: None,
            violations,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the schema name if known
    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }

    /// Location inside the schema source for compile errors
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Violations of a validation failure
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes the error, returning its violations
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

fn display_location(location: &str) -> &str {
    if location.is_empty() {
        "#"
    } else {
        location
    }
}
