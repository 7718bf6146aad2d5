//! Consistency reports

use serde::Serialize;
use std::fmt;

use super::errors::ConsistencyError;
use crate::fields::FieldPath;

/// Outcome of the three-way comparison. Every list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Observed in samples, missing from the field catalog
    pub payload_not_in_fields: Vec<FieldPath>,
    /// Declared in the catalog, never observed in samples
    pub fields_not_in_payload: Vec<FieldPath>,
    /// Observed in samples, not declared by the schema
    pub payload_not_in_schema: Vec<FieldPath>,
    /// Declared by the schema, never observed in samples
    pub schema_not_in_payload: Vec<FieldPath>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.sections().iter().all(|(_, paths)| paths.is_empty())
    }

    /// Number of offending paths across all lists
    pub fn mismatch_count(&self) -> usize {
        self.sections().iter().map(|(_, paths)| paths.len()).sum()
    }

    /// Converts a report with any offending path into an error.
    pub fn into_result(self) -> Result<(), ConsistencyError> {
        if self.is_consistent() {
            Ok(())
        } else {
            Err(ConsistencyError::Drift(self))
        }
    }

    fn sections(&self) -> [(&'static str, &[FieldPath]); 4] {
        [
            ("payload not in fields", self.payload_not_in_fields.as_slice()),
            ("fields not in payload", self.fields_not_in_payload.as_slice()),
            ("payload not in schema", self.payload_not_in_schema.as_slice()),
            ("schema not in payload", self.schema_not_in_payload.as_slice()),
        ]
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_consistent() {
            return write!(f, "consistent");
        }
        let mut first = true;
        for (title, paths) in self.sections() {
            if paths.is_empty() {
                continue;
            }
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            let names: Vec<&str> = paths.iter().map(FieldPath::as_str).collect();
            write!(f, "{}: [{}]", title, names.join(", "))?;
        }
        Ok(())
    }
}
