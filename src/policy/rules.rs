//! Presence rules
//!
//! Rules are plain data. New exclusivity or correlation constraints are new
//! table rows, never new code paths.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::fields::{FieldPath, FieldResult};

/// When a rule applies and what it demands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// If the rule field is present, none of these may be present
    Absence(Vec<FieldPath>),
    /// If every key of the example is present, the rule field is required.
    /// Only key presence matters; values are placeholders.
    Existence(BTreeMap<FieldPath, Value>),
}

/// A conditional presence rule for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRule {
    pub field: FieldPath,
    pub condition: Condition,
}

impl PresenceRule {
    /// `field` excludes every path in `others`.
    pub fn absence(field: &str, others: &[&str]) -> FieldResult<Self> {
        Ok(Self {
            field: FieldPath::parse(field)?,
            condition: Condition::Absence(
                others
                    .iter()
                    .map(|other| FieldPath::parse(*other))
                    .collect::<FieldResult<_>>()?,
            ),
        })
    }

    /// `field` is required whenever every key of `example` is present.
    pub fn existence(field: &str, example: &[(&str, Value)]) -> FieldResult<Self> {
        let mut pattern = BTreeMap::new();
        for (key, value) in example {
            pattern.insert(FieldPath::parse(*key)?, value.clone());
        }
        Ok(Self {
            field: FieldPath::parse(field)?,
            condition: Condition::Existence(pattern),
        })
    }

    /// Paths the condition refers to
    pub fn condition_paths(&self) -> Vec<&FieldPath> {
        match &self.condition {
            Condition::Absence(paths) => paths.iter().collect(),
            Condition::Existence(example) => example.keys().collect(),
        }
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        let paths = self.condition_paths();
        if paths.is_empty() {
            return Err("condition lists no fields".into());
        }
        if paths.iter().any(|path| **path == self.field) {
            return Err("condition refers to the rule's own field".into());
        }
        Ok(())
    }
}
