//! Required-key probe
//!
//! Takes a full sample event and removes its keys one at a time. Whether
//! the schema then rejects the event tells whether the key is required.
//! The observed answer is compared with the documented required set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{PolicyError, PolicyResult};
use crate::fields::{FieldPath, NamedSet};
use crate::payload::{flatten_keys, remove_path, set_path};
use crate::schema::{EventSchema, Violation};

/// Placeholder for fields a requirement needs to be present
pub const SENTINEL: &str = "abc123";

/// Circumstances under which a field is required
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum When {
    /// Required once all of these are removed
    WhenAbsent(Vec<FieldPath>),
    /// Required while all of these are present
    WhenPresent(Vec<FieldPath>),
}

/// A conditionally required field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub field: FieldPath,
    #[serde(flatten)]
    pub when: When,
}

/// A key whose observed requiredness disagrees with the documented one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirednessMismatch {
    pub field: FieldPath,
    pub documented_required: bool,
    /// What the schema reported once the key was removed
    pub violations: Vec<Violation>,
}

pub struct RequiredKeyProbe<'a> {
    schema: &'a EventSchema,
    sample: &'a Value,
}

impl<'a> RequiredKeyProbe<'a> {
    /// The sample must pass the schema before anything is removed.
    pub fn new(schema: &'a EventSchema, sample: &'a Value) -> PolicyResult<Self> {
        let violations = schema.violations(sample);
        if !violations.is_empty() {
            return Err(PolicyError::SampleRejected(violations));
        }
        Ok(Self { schema, sample })
    }

    /// Removes every key of the sample in turn and reports disagreements
    /// with `required`, in key order.
    pub fn check(
        &self,
        required: &NamedSet,
        requirements: &[Requirement],
    ) -> PolicyResult<Vec<RequirednessMismatch>> {
        let mut mismatches = Vec::new();
        for key in flatten_keys(self.sample) {
            let mut event = self.sample.clone();
            if let Some(requirement) = requirements.iter().find(|r| r.field == key) {
                self.prepare(&mut event, requirement)?;
            }
            remove_path(&mut event, key.as_str());

            let violations = self.schema.violations(&event);
            let documented_required = required.contains(key.as_str());
            if documented_required == violations.is_empty() {
                mismatches.push(RequirednessMismatch {
                    field: key,
                    documented_required,
                    violations,
                });
            }
        }
        Ok(mismatches)
    }

    fn prepare(&self, event: &mut Value, requirement: &Requirement) -> PolicyResult<()> {
        match &requirement.when {
            When::WhenAbsent(fields) => {
                for field in fields {
                    remove_path(event, field.as_str());
                }
            }
            When::WhenPresent(fields) => {
                let present = flatten_keys(event);
                for field in fields.iter().filter(|field| !present.contains(*field)) {
                    set_path(event, field.as_str(), Value::String(SENTINEL.into())).map_err(
                        |e| PolicyError::Unplaceable {
                            field: field.to_string(),
                            reason: e.to_string(),
                        },
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDefinition;
    use serde_json::json;
    use std::sync::Arc;

    fn event_schema() -> EventSchema {
        let definition = SchemaDefinition::from_value(
            "error",
            &json!({
                "type": "object",
                "properties": {
                    "id": {"type": "string"},
                    "culprit": {"type": "string"},
                    "trace_id": {"type": "string"},
                    "parent_id": {"type": "string"},
                    "exception": {
                        "type": "object",
                        "properties": {"message": {"type": "string"}, "type": {"type": "string"}},
                        "anyOf": [{"required": ["message"]}, {"required": ["type"]}]
                    }
                },
                "required": ["id"],
                "dependencies": {"trace_id": ["parent_id"], "parent_id": ["trace_id"]}
            }),
        )
        .unwrap();
        EventSchema::new(Arc::new(definition), "error")
    }

    fn sample() -> Value {
        json!({"error": {
            "id": "1",
            "culprit": "main",
            "trace_id": "t",
            "parent_id": "p",
            "exception": {"message": "boom", "type": "E"}
        }})
    }

    fn requirements() -> Vec<Requirement> {
        serde_json::from_value(json!([
            {"field": "error.exception.message", "when_absent": ["error.exception.type"]},
            {"field": "error.exception.type", "when_absent": ["error.exception.message"]},
            {"field": "error.trace_id", "when_present": ["error.parent_id"]},
            {"field": "error.parent_id", "when_present": ["error.trace_id"]}
        ]))
        .unwrap()
    }

    fn documented() -> NamedSet {
        NamedSet::builder("required")
            .literals([
                "error",
                "error.id",
                "error.exception.message",
                "error.exception.type",
                "error.trace_id",
                "error.parent_id",
            ])
            .build()
            .unwrap()
    }

    #[test]
    fn test_documented_requiredness_matches() {
        let schema = event_schema();
        let sample = sample();
        let probe = RequiredKeyProbe::new(&schema, &sample).unwrap();
        assert!(probe.check(&documented(), &requirements()).unwrap().is_empty());
    }

    #[test]
    fn test_reports_undocumented_required_key() {
        let schema = event_schema();
        let sample = sample();
        let probe = RequiredKeyProbe::new(&schema, &sample).unwrap();
        let required = NamedSet::builder("required")
            .literals(["error", "error.exception.message", "error.exception.type"])
            .literal("error.culprit")
            .literal("error.trace_id")
            .literal("error.parent_id")
            .build()
            .unwrap();

        let mismatches = probe.check(&required, &requirements()).unwrap();
        let fields: Vec<&str> = mismatches.iter().map(|m| m.field.as_str()).collect();
        assert_eq!(fields, vec!["error.culprit", "error.id"]);
        assert!(mismatches[0].documented_required);
        assert!(mismatches[0].violations.is_empty());
        assert!(!mismatches[1].documented_required);
        assert_eq!(mismatches[1].violations[0].pointer, "error.id");
    }

    #[test]
    fn test_condition_needed_for_alternatives() {
        let schema = event_schema();
        let sample = sample();
        let probe = RequiredKeyProbe::new(&schema, &sample).unwrap();
        // without the requirement table either alternative alone is enough
        let mismatches = probe.check(&documented(), &[]).unwrap();
        let fields: Vec<&str> = mismatches.iter().map(|m| m.field.as_str()).collect();
        assert_eq!(fields, vec!["error.exception.message", "error.exception.type"]);
    }

    #[test]
    fn test_invalid_sample_rejected() {
        let schema = event_schema();
        let sample = json!({"error": {"culprit": 1}});
        assert!(matches!(
            RequiredKeyProbe::new(&schema, &sample),
            Err(PolicyError::SampleRejected(v)) if v.len() == 2
        ));
    }
}
