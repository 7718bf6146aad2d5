//! Data validation cases
//!
//! A case places each listed value at one key of a valid base event. Valid
//! values must leave the event without violations; invalid values must be
//! rejected by the keyword named in the case.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::fields::FieldPath;
use crate::payload::set_path;
use crate::schema::{EventSchema, Violation};

/// Values to try at one key
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataCase {
    pub key: FieldPath,
    #[serde(default)]
    pub valid: Vec<Value>,
    #[serde(default)]
    pub invalid: Vec<InvalidValues>,
}

/// Values the schema must reject at `schema_path`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvalidValues {
    /// Fragment the failing keyword's schema path must contain
    pub schema_path: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaseOutcome {
    /// A valid value was rejected
    Rejected { violations: Vec<Violation> },
    /// An invalid value was accepted
    Accepted { expected: String },
    /// An invalid value was rejected, but by another keyword
    WrongKeyword {
        expected: String,
        violations: Vec<Violation>,
    },
    Unplaceable { reason: String },
}

/// One value that did not behave as documented
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseFailure {
    pub key: FieldPath,
    pub value: Value,
    #[serde(flatten)]
    pub outcome: CaseOutcome,
}

impl fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CaseOutcome::Rejected { violations } => write!(
                f,
                "{} = {} rejected ({})",
                self.key,
                self.value,
                violations
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_default()
            ),
            CaseOutcome::Accepted { expected } => {
                write!(f, "{} = {} accepted, expected {}", self.key, self.value, expected)
            }
            CaseOutcome::WrongKeyword { expected, violations } => {
                let paths: Vec<&str> = violations.iter().map(|v| v.schema_path.as_str()).collect();
                write!(
                    f,
                    "{} = {} rejected by [{}], expected {}",
                    self.key,
                    self.value,
                    paths.join(", "),
                    expected
                )
            }
            CaseOutcome::Unplaceable { reason } => {
                write!(f, "{} = {} cannot be placed: {}", self.key, self.value, reason)
            }
        }
    }
}

/// Runs every case against copies of `base`, in case order.
pub fn run_cases(schema: &EventSchema, base: &Value, cases: &[DataCase]) -> Vec<CaseFailure> {
    let mut failures = Vec::new();
    for case in cases {
        for value in &case.valid {
            let outcome = match violations_with(schema, base, &case.key, value) {
                Ok(violations) if violations.is_empty() => None,
                Ok(violations) => Some(CaseOutcome::Rejected { violations }),
                Err(reason) => Some(CaseOutcome::Unplaceable { reason }),
            };
            push_failure(&mut failures, case, value, outcome);
        }

        for group in &case.invalid {
            for value in &group.values {
                let outcome = match violations_with(schema, base, &case.key, value) {
                    Ok(violations) if violations.is_empty() => Some(CaseOutcome::Accepted {
                        expected: group.schema_path.clone(),
                    }),
                    Ok(violations)
                        if violations
                            .iter()
                            .any(|v| v.schema_path.contains(group.schema_path.as_str())) =>
                    {
                        None
                    }
                    Ok(violations) => Some(CaseOutcome::WrongKeyword {
                        expected: group.schema_path.clone(),
                        violations,
                    }),
                    Err(reason) => Some(CaseOutcome::Unplaceable { reason }),
                };
                push_failure(&mut failures, case, value, outcome);
            }
        }
    }
    failures
}

fn push_failure(failures: &mut Vec<CaseFailure>, case: &DataCase, value: &Value, outcome: Option<CaseOutcome>) {
    if let Some(outcome) = outcome {
        failures.push(CaseFailure {
            key: case.key.clone(),
            value: value.clone(),
            outcome,
        });
    }
}

fn violations_with(
    schema: &EventSchema,
    base: &Value,
    key: &FieldPath,
    value: &Value,
) -> Result<Vec<Violation>, String> {
    let mut event = base.clone();
    set_path(&mut event, key.as_str(), value.clone()).map_err(|e| e.to_string())?;
    Ok(schema.violations(&event))
}
