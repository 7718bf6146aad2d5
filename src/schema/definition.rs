//! Compiled schema definitions
//!
//! A `SchemaDefinition` is compiled once and never mutated afterwards. It is
//! `Send + Sync`, so processors share it through an `Arc` and validate from
//! any number of threads.

use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::compiler::Compiler;
use super::errors::{SchemaError, SchemaResult, Violation};
use super::types::{Dependency, NodeId, SchemaNode};
use super::validator::SchemaValidator;
use crate::fields::FieldPath;

/// Immutable compiled JSON Schema
#[derive(Debug)]
pub struct SchemaDefinition {
    name: String,
    nodes: Vec<SchemaNode>,
    root: NodeId,
}

impl SchemaDefinition {
    /// Compiles schema source text.
    ///
    /// # Errors
    ///
    /// Any [`SchemaError`] returned here is fatal.
    pub fn compile(name: &str, source: &str) -> SchemaResult<Self> {
        let value: Value = serde_json::from_str(source)
            .map_err(|e| SchemaError::malformed(name, "", format!("invalid JSON: {}", e)))?;
        Self::from_value(name, &value)
    }

    /// Compiles an already parsed schema document.
    pub fn from_value(name: &str, source: &Value) -> SchemaResult<Self> {
        let compiled = Compiler::compile(name, source)?;
        Ok(Self {
            name: name.to_string(),
            nodes: compiled.nodes,
            root: compiled.root,
        })
    }

    /// Reads and compiles a schema file. The file stem becomes the name.
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed(&name, "", format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::compile(&name, &content)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Validates a document, returning every violation on failure.
    pub fn validate(&self, document: &Value) -> Result<(), Vec<Violation>> {
        let violations = self.violations(document);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// All violations of a document; empty when it is valid.
    pub fn violations(&self, document: &Value) -> Vec<Violation> {
        SchemaValidator::new(self).violations(document)
    }

    /// Every `properties` key reachable by dotted traversal, sorted.
    pub fn declared_paths(&self) -> Vec<FieldPath> {
        self.declared_paths_under(&FieldPath::root())
    }

    /// Declared paths, each prefixed by `prefix`.
    ///
    /// Traversal passes through `items`, `$ref`, combinator branches and
    /// dependency schemas. A node already on the current path is not entered
    /// again, which keeps recursive schemas finite.
    pub fn declared_paths_under(&self, prefix: &FieldPath) -> Vec<FieldPath> {
        let mut paths = BTreeSet::new();
        let mut stack = Vec::new();
        self.collect_paths(self.root, prefix, &mut stack, &mut paths);
        paths.into_iter().collect()
    }

    fn collect_paths(
        &self,
        id: NodeId,
        prefix: &FieldPath,
        stack: &mut Vec<NodeId>,
        paths: &mut BTreeSet<FieldPath>,
    ) {
        if stack.contains(&id) {
            return;
        }
        stack.push(id);

        let node = self.node(id);
        for (key, property) in &node.properties {
            if key.is_empty() {
                continue;
            }
            let path = prefix.child(key);
            paths.insert(path.clone());
            self.collect_paths(*property, &path, stack, paths);
        }

        let same_level = node
            .items
            .iter()
            .chain(&node.all_of)
            .chain(&node.any_of)
            .chain(&node.one_of)
            .copied()
            .chain(node.dependencies.values().filter_map(|dep| match dep {
                Dependency::Schema(id) => Some(*id),
                Dependency::Properties(_) => None,
            }));
        for child in same_level {
            self.collect_paths(child, prefix, stack, paths);
        }

        stack.pop();
    }
}

/// A schema bound to the envelope key of an intake event.
///
/// Intake events look like `{"error": {...}}`; the definition describes the
/// inner object and every pointer is reported from the event root.
#[derive(Debug, Clone)]
pub struct EventSchema {
    definition: Arc<SchemaDefinition>,
    event_key: String,
}

impl EventSchema {
    pub fn new(definition: Arc<SchemaDefinition>, event_key: impl Into<String>) -> Self {
        Self {
            definition,
            event_key: event_key.into(),
        }
    }

    pub fn definition(&self) -> &Arc<SchemaDefinition> {
        &self.definition
    }

    pub fn event_key(&self) -> &str {
        &self.event_key
    }

    /// Violations of a whole event.
    pub fn violations(&self, event: &Value) -> Vec<Violation> {
        match event.get(&self.event_key) {
            Some(inner) => SchemaValidator::new(&self.definition).violations_at(inner, &self.event_key),
            None => vec![Violation::missing_property(self.event_key.clone(), String::new())],
        }
    }

    pub fn validate(&self, event: &Value) -> Result<(), Vec<Violation>> {
        let violations = self.violations(event);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Declared paths prefixed by the envelope key. The key itself is not
    /// a declared property.
    pub fn declared_paths(&self) -> Vec<FieldPath> {
        self.definition
            .declared_paths_under(&FieldPath::root().child(&self.event_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(schema: &SchemaDefinition) -> Vec<String> {
        schema.declared_paths().into_iter().map(String::from).collect()
    }

    #[test]
    fn test_compile_rejects_invalid_json() {
        let err = SchemaDefinition::compile("error", "{not json").unwrap_err();
        assert_eq!(err.code().code(), "GATE_SCHEMA_MALFORMED");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_declared_paths_follow_items_and_refs() {
        let schema = SchemaDefinition::from_value(
            "error",
            &json!({
                "type": "object",
                "definitions": {
                    "frame": {"type": "object", "properties": {"filename": {"type": "string"}}}
                },
                "properties": {
                    "exception": {
                        "type": "object",
                        "properties": {
                            "stacktrace": {"type": "array", "items": {"$ref": "#/definitions/frame"}}
                        },
                        "anyOf": [{"properties": {"message": {"type": "string"}}}]
                    }
                }
            }),
        )
        .unwrap();
        assert_eq!(
            paths(&schema),
            vec![
                "exception",
                "exception.message",
                "exception.stacktrace",
                "exception.stacktrace.filename"
            ]
        );
    }

    #[test]
    fn test_declared_paths_terminate_on_recursion() {
        let schema = SchemaDefinition::from_value(
            "tree",
            &json!({
                "type": "object",
                "properties": {"name": {"type": "string"}, "child": {"$ref": "#"}}
            }),
        )
        .unwrap();
        assert_eq!(paths(&schema), vec!["child", "name"]);
    }

    #[test]
    fn test_event_schema_prefixes_pointers() {
        let definition = SchemaDefinition::from_value(
            "error",
            &json!({
                "type": "object",
                "properties": {"id": {"type": "string", "maxLength": 4}},
                "required": ["id"]
            }),
        )
        .unwrap();
        let schema = EventSchema::new(Arc::new(definition), "error");

        assert!(schema.validate(&json!({"error": {"id": "abcd"}})).is_ok());

        let violations = schema.violations(&json!({"error": {"id": "abcde"}}));
        assert_eq!(violations[0].pointer, "error.id");
        assert_eq!(violations[0].schema_path, "/properties/id/maxLength");

        let violations = schema.violations(&json!({"error": false}));
        assert_eq!(violations[0].pointer, "error");
        assert_eq!(violations[0].schema_path, "/type");

        let violations = schema.violations(&json!({"transaction": {}}));
        assert_eq!(violations[0].pointer, "error");
        assert_eq!(violations[0].message, "required property is missing");

        let declared: Vec<String> = schema.declared_paths().into_iter().map(String::from).collect();
        assert_eq!(declared, vec!["error.id"]);
    }

    #[test]
    fn test_definition_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaDefinition>();
        assert_send_sync::<EventSchema>();
    }

    #[test]
    fn test_load_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("span.json");
        fs::write(&path, r#"{"type": "object"}"#).unwrap();
        let schema = SchemaDefinition::load(&path).unwrap();
        assert_eq!(schema.name(), "span");

        let missing = SchemaDefinition::load(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(missing.schema_name(), Some("absent"));
    }
}
