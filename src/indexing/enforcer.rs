//! Indexing constraint enforcement
//!
//! For every keyword field the catalog exposes, the schema must accept a
//! value at the indexing limit and reject one a character longer. Dynamic
//! maps must also reject keys the backend cannot store.
//!
//! Values are placed into copies of a base event; only violations at or
//! below the probed pointer count, so unrelated problems elsewhere in the
//! base event never produce a verdict.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::constraint::{KeywordConstraint, DISALLOWED_KEY_CHARS};
use super::errors::IndexingError;
use crate::fields::{within_prefix, FieldCatalog, FieldCatalogEntry, FieldPath, NamedSet};
use crate::payload::set_path;
use crate::schema::{EventSchema, Violation};

const MAP_VALUE: &str = "x";

/// Rewrites a catalog path prefix into an event path prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Catalog prefix, e.g. `trace.id`
    pub template: String,
    /// Event prefix replacing it, e.g. `error.trace_id`
    #[serde(default)]
    pub mapping: String,
}

impl FieldMapping {
    pub fn new(template: impl Into<String>, mapping: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            mapping: mapping.into(),
        }
    }

    /// Rewrites `path` when it lies under the template.
    ///
    /// A template ending in `.` covers everything below it; any other
    /// template matches whole segments only.
    fn apply(&self, path: &str) -> Option<String> {
        let rest = path.strip_prefix(self.template.as_str())?;
        if self.template.ends_with('.') || rest.is_empty() || rest.starts_with('.') {
            Some(format!("{}{}", self.mapping, rest))
        } else {
            None
        }
    }
}

/// Why a field's observed behaviour disagrees with its limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MismatchKind {
    /// A value at the limit was rejected
    RejectedAtLimit { limit: usize, violations: Vec<Violation> },
    /// A value over the limit was accepted
    AcceptedOverLimit { limit: usize },
    /// A key with a forbidden character was accepted
    AcceptedDisallowedKey { key: String },
    /// An allowed key of `length` characters was rejected
    RejectedAllowedKey { length: usize, violations: Vec<Violation> },
    /// A key over the limit was accepted
    AcceptedLongKey { length: usize },
    /// The probe value could not be placed in the base event
    Unplaceable { reason: String },
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchKind::RejectedAtLimit { limit, .. } => {
                write!(f, "value of {} characters rejected", limit)
            }
            MismatchKind::AcceptedOverLimit { limit } => {
                write!(f, "value of {} characters accepted", limit + 1)
            }
            MismatchKind::AcceptedDisallowedKey { key } => write!(f, "key '{}' accepted", key),
            MismatchKind::RejectedAllowedKey { length, .. } => {
                write!(f, "allowed key of {} characters rejected", length)
            }
            MismatchKind::AcceptedLongKey { length } => {
                write!(f, "key of {} characters accepted", length)
            }
            MismatchKind::Unplaceable { reason } => write!(f, "cannot place value: {}", reason),
        }
    }
}

/// One disagreement between schema and indexing limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexingMismatch {
    pub field: FieldPath,
    pub event_path: String,
    pub kind: MismatchKind,
}

/// Outcome of a keyword limit check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexingReport {
    /// Number of catalog entries probed
    pub checked: usize,
    /// Keyword or dynamic entries no mapping covers
    pub unmapped: Vec<FieldPath>,
    pub mismatches: Vec<IndexingMismatch>,
}

impl IndexingReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Catalog fields with at least one mismatch, in catalog order
    pub fn fields(&self) -> Vec<&FieldPath> {
        let mut fields: Vec<&FieldPath> = self.mismatches.iter().map(|m| &m.field).collect();
        fields.dedup();
        fields
    }

    pub fn into_result(self) -> Result<(), IndexingError> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(IndexingError::Diverged(self))
        }
    }
}

impl fmt::Display for IndexingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "{} field(s) within limits", self.checked);
        }
        let rendered: Vec<String> = self
            .mismatches
            .iter()
            .map(|m| format!("{} ({})", m.field, m.kind))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

/// Probes a schema with values at and beyond the indexing limits.
pub struct KeywordEnforcer<'a> {
    schema: &'a EventSchema,
    base_event: &'a Value,
    mappings: &'a [FieldMapping],
}

impl<'a> KeywordEnforcer<'a> {
    /// With no mappings catalog paths are used as event paths unchanged.
    pub fn new(schema: &'a EventSchema, base_event: &'a Value, mappings: &'a [FieldMapping]) -> Self {
        Self {
            schema,
            base_event,
            mappings,
        }
    }

    /// Checks every keyword and dynamic map entry not in `exceptions`.
    pub fn check_keyword_limits(&self, catalog: &FieldCatalog, exceptions: &NamedSet) -> IndexingReport {
        let mut report = IndexingReport::default();
        for entry in catalog.entries() {
            if !(entry.is_string_typed() || entry.is_dynamic_map) {
                continue;
            }
            if exceptions.contains(entry.path.as_str()) {
                continue;
            }
            let event_path = match self.event_path(entry.path.as_str()) {
                Some(path) => path,
                None => {
                    report.unmapped.push(entry.path.clone());
                    continue;
                }
            };

            report.checked += 1;
            let kinds = if entry.is_dynamic_map {
                self.check_map_keys(entry, &event_path)
            } else {
                self.check_value_length(entry, &event_path)
            };
            report.mismatches.extend(kinds.into_iter().map(|kind| IndexingMismatch {
                field: entry.path.clone(),
                event_path: event_path.clone(),
                kind,
            }));
        }
        report
    }

    fn event_path(&self, path: &str) -> Option<String> {
        if self.mappings.is_empty() {
            return Some(path.to_string());
        }
        self.mappings.iter().find_map(|mapping| mapping.apply(path))
    }

    fn check_value_length(&self, entry: &FieldCatalogEntry, event_path: &str) -> Vec<MismatchKind> {
        let constraint = KeywordConstraint::for_entry(entry);
        let mut kinds = Vec::new();

        match self.violations_with(event_path, Value::String(constraint.value_at_limit())) {
            Ok(violations) if !violations.is_empty() => kinds.push(MismatchKind::RejectedAtLimit {
                limit: constraint.max_length,
                violations,
            }),
            Ok(_) => {}
            Err(kind) => return vec![kind],
        }
        match self.violations_with(event_path, Value::String(constraint.value_over_limit())) {
            Ok(violations) if violations.is_empty() => kinds.push(MismatchKind::AcceptedOverLimit {
                limit: constraint.max_length,
            }),
            Ok(_) => {}
            Err(kind) => kinds.push(kind),
        }
        kinds
    }

    fn check_map_keys(&self, entry: &FieldCatalogEntry, event_path: &str) -> Vec<MismatchKind> {
        let constraint = KeywordConstraint::for_entry(entry);
        let mut kinds = Vec::new();

        for c in DISALLOWED_KEY_CHARS {
            let key = format!("what{}ever", c);
            match self.violations_with(event_path, single_entry_map(&key)) {
                Ok(violations) if violations.is_empty() => {
                    kinds.push(MismatchKind::AcceptedDisallowedKey { key })
                }
                Ok(_) => {}
                Err(kind) => return vec![kind],
            }
        }

        let at_limit = "k".repeat(constraint.max_length);
        match self.violations_with(event_path, single_entry_map(&at_limit)) {
            Ok(violations) if !violations.is_empty() => kinds.push(MismatchKind::RejectedAllowedKey {
                length: constraint.max_length,
                violations,
            }),
            Ok(_) => {}
            Err(kind) => kinds.push(kind),
        }

        let over_limit = "k".repeat(constraint.max_length + 1);
        match self.violations_with(event_path, single_entry_map(&over_limit)) {
            Ok(violations) if violations.is_empty() => kinds.push(MismatchKind::AcceptedLongKey {
                length: constraint.max_length + 1,
            }),
            Ok(_) => {}
            Err(kind) => kinds.push(kind),
        }
        kinds
    }

    /// Violations at or below `event_path` after placing `value` there.
    fn violations_with(&self, event_path: &str, value: Value) -> Result<Vec<Violation>, MismatchKind> {
        let mut event = self.base_event.clone();
        set_path(&mut event, event_path, value).map_err(|e| MismatchKind::Unplaceable {
            reason: e.to_string(),
        })?;
        Ok(self
            .schema
            .violations(&event)
            .into_iter()
            .filter(|violation| within_prefix(event_path, &without_indices(&violation.pointer)))
            .collect())
    }
}

fn single_entry_map(key: &str) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), Value::String(MAP_VALUE.into()));
    Value::Object(map)
}

/// `frames[0].filename` -> `frames.filename`
fn without_indices(pointer: &str) -> String {
    let mut out = String::with_capacity(pointer.len());
    let mut in_index = false;
    for c in pointer.chars() {
        match c {
            '[' => in_index = true,
            ']' => in_index = false,
            _ if !in_index => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldTemplate;
    use crate::schema::SchemaDefinition;
    use serde_json::json;
    use std::sync::Arc;

    fn event_schema(schema: Value) -> EventSchema {
        EventSchema::new(Arc::new(SchemaDefinition::from_value("error", &schema).unwrap()), "error")
    }

    fn error_schema() -> EventSchema {
        event_schema(json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "maxLength": 1024},
                "culprit": {"type": ["string", "null"]},
                "trace_id": {"type": ["string", "null"], "maxLength": 1024},
                "frames": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"module": {"type": "string", "maxLength": 1024}}}
                },
                "tags": {
                    "type": ["object", "null"],
                    "patternProperties": {"^[^.*\"]*$": {"type": ["string", "number", "boolean", "null"]}},
                    "additionalProperties": false,
                    "propertyNames": {"maxLength": 1024}
                },
                "custom": {"type": ["object", "null"]}
            },
            "required": ["id"]
        }))
    }

    fn base_event() -> Value {
        json!({"error": {"id": "1", "frames": [{"module": "m"}], "tags": {"a": "b"}}})
    }

    fn catalog(fields: Vec<FieldTemplate>) -> FieldCatalog {
        FieldCatalog::build(&[FieldTemplate::group("error", fields)]).unwrap()
    }

    fn mismatched(report: &IndexingReport) -> Vec<&str> {
        report.fields().into_iter().map(FieldPath::as_str).collect()
    }

    #[test]
    fn test_limits_enforced() {
        let schema = error_schema();
        let base = base_event();
        let catalog = catalog(vec![
            FieldTemplate::keyword("id"),
            FieldTemplate::keyword("trace_id"),
            FieldTemplate::group("frames", vec![FieldTemplate::keyword("module")]),
            FieldTemplate::dynamic_object("tags"),
        ]);
        let report =
            KeywordEnforcer::new(&schema, &base, &[]).check_keyword_limits(&catalog, &NamedSet::empty("none"));
        assert!(report.is_clean(), "{}", report);
        assert_eq!(report.checked, 4);
    }

    #[test]
    fn test_missing_limit_detected() {
        let schema = error_schema();
        let base = base_event();
        let catalog = catalog(vec![FieldTemplate::keyword("id"), FieldTemplate::keyword("culprit")]);
        let report =
            KeywordEnforcer::new(&schema, &base, &[]).check_keyword_limits(&catalog, &NamedSet::empty("none"));
        assert_eq!(mismatched(&report), vec!["error.culprit"]);
        assert_eq!(
            report.mismatches[0].kind,
            MismatchKind::AcceptedOverLimit { limit: 1024 }
        );
        assert!(report.into_result().is_err());
    }

    #[test]
    fn test_exceptions_skip_fields() {
        let schema = error_schema();
        let base = base_event();
        let catalog = catalog(vec![FieldTemplate::keyword("culprit"), FieldTemplate::dynamic_object("custom")]);
        let exceptions = NamedSet::builder("keyword exceptions")
            .literal("error.culprit")
            .literal("error.custom")
            .build()
            .unwrap();
        let report = KeywordEnforcer::new(&schema, &base, &[]).check_keyword_limits(&catalog, &exceptions);
        assert!(report.is_clean());
        assert_eq!(report.checked, 0);
    }

    #[test]
    fn test_unrestricted_dynamic_map_detected() {
        let schema = error_schema();
        let base = base_event();
        let catalog = catalog(vec![FieldTemplate::dynamic_object("custom")]);
        let report =
            KeywordEnforcer::new(&schema, &base, &[]).check_keyword_limits(&catalog, &NamedSet::empty("none"));
        // three forbidden characters plus the long key
        assert_eq!(report.mismatches.len(), 4);
        assert!(report
            .mismatches
            .iter()
            .any(|m| m.kind == MismatchKind::AcceptedDisallowedKey { key: "what*ever".into() }));
        assert!(report
            .mismatches
            .iter()
            .any(|m| m.kind == MismatchKind::AcceptedLongKey { length: 1025 }));
    }

    #[test]
    fn test_stricter_schema_rejects_at_limit() {
        let schema = event_schema(json!({
            "type": "object",
            "properties": {"id": {"type": "string", "maxLength": 64}}
        }));
        let base = json!({"error": {"id": "1"}});
        let catalog = catalog(vec![FieldTemplate::keyword("id")]);
        let report =
            KeywordEnforcer::new(&schema, &base, &[]).check_keyword_limits(&catalog, &NamedSet::empty("none"));
        match &report.mismatches[0].kind {
            MismatchKind::RejectedAtLimit { limit, violations } => {
                assert_eq!(*limit, 1024);
                assert_eq!(violations[0].keyword(), "maxLength");
            }
            other => panic!("unexpected mismatch: {:?}", other),
        }
    }

    #[test]
    fn test_mapping_respects_segments() {
        let mapping = FieldMapping::new("trace.id", "error.trace_id");
        assert_eq!(mapping.apply("trace.id").as_deref(), Some("error.trace_id"));
        assert_eq!(mapping.apply("trace.id.raw").as_deref(), Some("error.trace_id.raw"));
        assert_eq!(mapping.apply("trace.identity"), None);
        assert_eq!(mapping.apply("trace"), None);

        let prefix = FieldMapping::new("error.", "error.");
        assert_eq!(prefix.apply("error.id").as_deref(), Some("error.id"));
        assert_eq!(prefix.apply("errors.id"), None);
    }

    #[test]
    fn test_mappings_rewrite_and_skip() {
        let schema = error_schema();
        let base = base_event();
        let catalog = FieldCatalog::build(&[
            FieldTemplate::group("error", vec![FieldTemplate::keyword("id")]),
            FieldTemplate::group("trace", vec![FieldTemplate::keyword("id")]),
            FieldTemplate::group("processor", vec![FieldTemplate::keyword("name")]),
        ])
        .unwrap();
        let mappings = vec![
            FieldMapping::new("error.", "error."),
            FieldMapping::new("trace.id", "error.trace_id"),
        ];
        let report = KeywordEnforcer::new(&schema, &base, &mappings)
            .check_keyword_limits(&catalog, &NamedSet::empty("none"));
        assert!(report.is_clean(), "{}", report);
        assert_eq!(report.checked, 2);
        let unmapped: Vec<&str> = report.unmapped.iter().map(FieldPath::as_str).collect();
        assert_eq!(unmapped, vec!["processor.name"]);
    }

    #[test]
    fn test_without_indices() {
        assert_eq!(without_indices("error.frames[12].module"), "error.frames.module");
        assert_eq!(without_indices("error.tags"), "error.tags");
    }
}
