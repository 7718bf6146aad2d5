//! Conditional presence rule evaluation
//!
//! Presence is judged on the flattened key set of a document, so a key
//! holding `null` is absent and a key inside any array element is present.
//! Rules never short-circuit each other; violations are pooled in rule order.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use super::errors::{PolicyError, PolicyResult};
use super::rules::{Condition, PresenceRule};
use crate::fields::FieldPath;
use crate::payload::flatten_keys;

/// A broken presence rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleViolation {
    /// Two mutually exclusive fields are both present
    Conflict {
        field: FieldPath,
        conflicting_field: FieldPath,
    },
    /// A triggered existence rule found its field absent
    MissingRequiredField {
        field: FieldPath,
        trigger: Vec<FieldPath>,
    },
}

impl RuleViolation {
    /// The rule field the violation belongs to
    pub fn field(&self) -> &FieldPath {
        match self {
            RuleViolation::Conflict { field, .. } => field,
            RuleViolation::MissingRequiredField { field, .. } => field,
        }
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleViolation::Conflict {
                field,
                conflicting_field,
            } => write!(f, "'{}' must not appear together with '{}'", field, conflicting_field),
            RuleViolation::MissingRequiredField { field, trigger } => {
                let trigger: Vec<&str> = trigger.iter().map(FieldPath::as_str).collect();
                write!(f, "'{}' is required when [{}] are present", field, trigger.join(", "))
            }
        }
    }
}

/// Evaluates rules against a document.
pub fn evaluate(document: &Value, rules: &[PresenceRule]) -> Vec<RuleViolation> {
    evaluate_keys(&flatten_keys(document), rules)
}

/// Evaluates rules against an already flattened key set.
pub fn evaluate_keys(present: &BTreeSet<FieldPath>, rules: &[PresenceRule]) -> Vec<RuleViolation> {
    let mut violations = Vec::new();
    for rule in rules {
        match &rule.condition {
            Condition::Absence(others) => {
                if !present.contains(&rule.field) {
                    continue;
                }
                for other in others.iter().filter(|other| present.contains(*other)) {
                    violations.push(RuleViolation::Conflict {
                        field: rule.field.clone(),
                        conflicting_field: other.clone(),
                    });
                }
            }
            Condition::Existence(example) => {
                let triggered = example.keys().all(|key| present.contains(key));
                if triggered && !present.contains(&rule.field) {
                    violations.push(RuleViolation::MissingRequiredField {
                        field: rule.field.clone(),
                        trigger: example.keys().cloned().collect(),
                    });
                }
            }
        }
    }
    violations
}

/// A validated rule table
#[derive(Debug, Clone, Default)]
pub struct PresencePolicy {
    rules: Vec<PresenceRule>,
}

impl PresencePolicy {
    /// Validates and wraps a rule table.
    pub fn new(rules: Vec<PresenceRule>) -> PolicyResult<Self> {
        for rule in &rules {
            rule.check().map_err(|reason| PolicyError::InvalidRule {
                field: rule.field.to_string(),
                reason,
            })?;
        }
        Ok(Self { rules })
    }

    /// Parses a JSON rule table.
    pub fn from_json(source: &str) -> PolicyResult<Self> {
        let rules: Vec<PresenceRule> =
            serde_json::from_str(source).map_err(|e| PolicyError::Load(e.to_string()))?;
        Self::new(rules)
    }

    pub fn rules(&self) -> &[PresenceRule] {
        &self.rules
    }

    pub fn evaluate(&self, document: &Value) -> Vec<RuleViolation> {
        evaluate(document, &self.rules)
    }

    /// Policy-compliant documents pass; anything else is `Violated`.
    pub fn check(&self, document: &Value) -> PolicyResult<()> {
        let violations = self.evaluate(document);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(PolicyError::Violated(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn correlation_rules() -> Vec<PresenceRule> {
        let ids = ["error.trace_id", "error.transaction_id", "error.parent_id"];
        let mut rules = Vec::new();
        for trigger in ids {
            for field in ids.iter().filter(|field| **field != trigger) {
                rules.push(PresenceRule::existence(field, &[(trigger, json!("abc123"))]).unwrap());
            }
        }
        rules
    }

    #[test]
    fn test_absence_conflict() {
        let rules = vec![
            PresenceRule::absence("error.exception", &["error.log"]).unwrap(),
            PresenceRule::absence("error.log", &["error.exception"]).unwrap(),
        ];
        let violations = evaluate(
            &json!({"error": {"exception": {"message": "boom"}, "log": {"message": "boom"}}}),
            &rules,
        );
        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations[0],
            RuleViolation::Conflict {
                field: FieldPath::parse("error.exception").unwrap(),
                conflicting_field: FieldPath::parse("error.log").unwrap(),
            }
        );
        assert!(evaluate(&json!({"error": {"log": {"message": "m"}}}), &rules).is_empty());
    }

    #[test]
    fn test_null_counts_as_absent() {
        let rules = vec![PresenceRule::absence("error.exception", &["error.log"]).unwrap()];
        let doc = json!({"error": {"exception": {"type": "E"}, "log": null}});
        assert!(evaluate(&doc, &rules).is_empty());
    }

    #[test]
    fn test_correlation_ids_travel_together() {
        let rules = correlation_rules();
        assert!(evaluate(&json!({"error": {"id": "1"}}), &rules).is_empty());
        assert!(evaluate(
            &json!({"error": {"trace_id": "t", "transaction_id": "x", "parent_id": "p"}}),
            &rules
        )
        .is_empty());

        for id in ["trace_id", "transaction_id", "parent_id"] {
            let mut error = serde_json::Map::new();
            error.insert(id.to_string(), json!("abc"));
            let violations = evaluate(&json!({ "error": error }), &rules);
            assert_eq!(violations.len(), 2, "only {} present", id);
            assert!(violations
                .iter()
                .all(|v| matches!(v, RuleViolation::MissingRequiredField { .. })));
        }
    }

    #[test]
    fn test_existence_ignores_example_values() {
        let rules = vec![PresenceRule::existence(
            "error.trace_id",
            &[("error.parent_id", json!("abc123")), ("error.transaction_id", json!("abc123"))],
        )
        .unwrap()];
        let doc = json!({"error": {"parent_id": "real", "transaction_id": 42}});
        let violations = evaluate(&doc, &rules);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field().as_str(), "error.trace_id");
        assert_eq!(
            violations[0].to_string(),
            "'error.trace_id' is required when [error.parent_id, error.transaction_id] are present"
        );

        // only part of the trigger pattern present
        let doc = json!({"error": {"parent_id": "real"}});
        assert!(evaluate(&doc, &rules).is_empty());
    }

    #[test]
    fn test_policy_check() {
        let policy = PresencePolicy::from_json(
            r#"[{"field": "error.log", "condition": {"absence": ["error.exception"]}}]"#,
        )
        .unwrap();
        assert_eq!(policy.rules().len(), 1);
        assert!(policy.check(&json!({"error": {"log": {}}})).is_ok());
        match policy.check(&json!({"error": {"log": {}, "exception": {}}})) {
            Err(PolicyError::Violated(violations)) => assert_eq!(violations.len(), 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_policy_rejects_invalid_table() {
        let err = PresencePolicy::new(vec![
            PresenceRule::absence("error.log", &["error.log"]).unwrap(),
        ])
        .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidRule { .. }));
        assert!(matches!(PresencePolicy::from_json("{}"), Err(PolicyError::Load(_))));
    }
}
