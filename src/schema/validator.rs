//! Document validation against a compiled schema
//!
//! Validation semantics:
//! - Every violation in the document is reported, not just the first
//! - A type mismatch stops checking that value; siblings are still checked
//! - `$ref` is transparent: schema paths follow the keywords traversed
//! - The validator never mutates the document and keeps no state between
//!   calls

use serde_json::{Map, Value};

use super::compiler::escape_pointer_segment;
use super::definition::SchemaDefinition;
use super::errors::{SchemaError, SchemaResult, Violation};
use super::types::{Additional, Dependency, JsonType, NodeId};

/// Schema validator that enforces a compiled schema on documents.
///
/// Borrowing the definition makes a validator free to create per request.
pub struct SchemaValidator<'a> {
    schema: &'a SchemaDefinition,
}

impl<'a> SchemaValidator<'a> {
    /// Creates a new validator for the given schema.
    pub fn new(schema: &'a SchemaDefinition) -> Self {
        Self { schema }
    }

    /// Validates a document against the schema.
    ///
    /// # Errors
    ///
    /// Returns `GATE_SCHEMA_VALIDATION_FAILED` carrying every violation.
    pub fn validate_document(&self, document: &Value) -> SchemaResult<()> {
        let violations = self.violations(document);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::validation_failed(self.schema.name(), violations))
        }
    }

    /// Collects all violations, with pointers relative to the document root.
    pub fn violations(&self, document: &Value) -> Vec<Violation> {
        self.violations_at(document, "")
    }

    /// Collects all violations, prefixing pointers with `pointer`.
    pub fn violations_at(&self, document: &Value, pointer: &str) -> Vec<Violation> {
        let mut out = Vec::new();
        self.check(self.schema.root(), document, pointer, "", &mut out);
        out
    }

    fn passes(&self, id: NodeId, value: &Value, pointer: &str, schema_path: &str) -> bool {
        let mut scratch = Vec::new();
        self.check(id, value, pointer, schema_path, &mut scratch);
        scratch.is_empty()
    }

    fn check(
        &self,
        id: NodeId,
        value: &Value,
        pointer: &str,
        schema_path: &str,
        out: &mut Vec<Violation>,
    ) {
        let node = self.schema.node(id);

        if !node.types.is_empty() && !node.types.iter().any(|t| t.matches(value)) {
            out.push(Violation::type_mismatch(
                pointer,
                keyword_path(schema_path, "type"),
                &node.expected_types(),
                JsonType::of(value),
            ));
            return;
        }

        if let Some(allowed) = &node.enumeration {
            if !allowed.iter().any(|candidate| json_equal(candidate, value)) {
                out.push(Violation::new(
                    pointer,
                    keyword_path(schema_path, "enum"),
                    format!("value {} is not one of the allowed values", value),
                ));
            }
        }

        match value {
            Value::String(text) => self.check_string(id, text, pointer, schema_path, out),
            Value::Number(number) => {
                if let Some(n) = number.as_f64() {
                    if let Some(minimum) = node.minimum.filter(|min| n < *min) {
                        out.push(Violation::new(
                            pointer,
                            keyword_path(schema_path, "minimum"),
                            format!("{} is less than the minimum of {}", number, minimum),
                        ));
                    }
                    if let Some(maximum) = node.maximum.filter(|max| n > *max) {
                        out.push(Violation::new(
                            pointer,
                            keyword_path(schema_path, "maximum"),
                            format!("{} is greater than the maximum of {}", number, maximum),
                        ));
                    }
                }
            }
            Value::Array(items) => self.check_array(id, items, pointer, schema_path, out),
            Value::Object(map) => self.check_object(id, map, value, pointer, schema_path, out),
            Value::Null | Value::Bool(_) => {}
        }

        for (i, branch) in node.all_of.iter().enumerate() {
            let path = format!("{}/allOf/{}", schema_path, i);
            self.check(*branch, value, pointer, &path, out);
        }

        if !node.any_of.is_empty() {
            let matched = node.any_of.iter().enumerate().any(|(i, branch)| {
                self.passes(*branch, value, pointer, &format!("{}/anyOf/{}", schema_path, i))
            });
            if !matched {
                out.push(Violation::new(
                    pointer,
                    keyword_path(schema_path, "anyOf"),
                    format!("value matches none of the {} alternatives", node.any_of.len()),
                ));
            }
        }

        if !node.one_of.is_empty() {
            let matched = node
                .one_of
                .iter()
                .enumerate()
                .filter(|(i, branch)| {
                    self.passes(**branch, value, pointer, &format!("{}/oneOf/{}", schema_path, i))
                })
                .count();
            if matched != 1 {
                out.push(Violation::new(
                    pointer,
                    keyword_path(schema_path, "oneOf"),
                    format!("value matches {} of the alternatives, expected exactly one", matched),
                ));
            }
        }

        if let Some(not) = node.not {
            if self.passes(not, value, pointer, &keyword_path(schema_path, "not")) {
                out.push(Violation::new(
                    pointer,
                    keyword_path(schema_path, "not"),
                    "value must not match the schema",
                ));
            }
        }
    }

    fn check_string(
        &self,
        id: NodeId,
        text: &str,
        pointer: &str,
        schema_path: &str,
        out: &mut Vec<Violation>,
    ) {
        let node = self.schema.node(id);
        if node.max_length.is_some() || node.min_length.is_some() {
            let length = text.chars().count();
            if let Some(max) = node.max_length.filter(|max| length > *max) {
                out.push(Violation::new(
                    pointer,
                    keyword_path(schema_path, "maxLength"),
                    format!("length {} exceeds the maximum of {}", length, max),
                ));
            }
            if let Some(min) = node.min_length.filter(|min| length < *min) {
                out.push(Violation::new(
                    pointer,
                    keyword_path(schema_path, "minLength"),
                    format!("length {} is below the minimum of {}", length, min),
                ));
            }
        }
        if let Some(pattern) = &node.pattern {
            if !pattern.is_match(text) {
                out.push(Violation::new(
                    pointer,
                    keyword_path(schema_path, "pattern"),
                    format!("does not match pattern '{}'", pattern.as_str()),
                ));
            }
        }
    }

    fn check_array(
        &self,
        id: NodeId,
        items: &[Value],
        pointer: &str,
        schema_path: &str,
        out: &mut Vec<Violation>,
    ) {
        let node = self.schema.node(id);
        if let Some(max) = node.max_items.filter(|max| items.len() > *max) {
            out.push(Violation::new(
                pointer,
                keyword_path(schema_path, "maxItems"),
                format!("{} items exceed the maximum of {}", items.len(), max),
            ));
        }
        if let Some(min) = node.min_items.filter(|min| items.len() < *min) {
            out.push(Violation::new(
                pointer,
                keyword_path(schema_path, "minItems"),
                format!("{} items are below the minimum of {}", items.len(), min),
            ));
        }
        if let Some(item_schema) = node.items {
            let path = keyword_path(schema_path, "items");
            for (i, item) in items.iter().enumerate() {
                self.check(item_schema, item, &index_pointer(pointer, i), &path, out);
            }
        }
    }

    fn check_object(
        &self,
        id: NodeId,
        map: &Map<String, Value>,
        value: &Value,
        pointer: &str,
        schema_path: &str,
        out: &mut Vec<Violation>,
    ) {
        let node = self.schema.node(id);

        for name in &node.required {
            if !map.contains_key(name) {
                out.push(Violation::missing_property(
                    child_pointer(pointer, name),
                    keyword_path(schema_path, "required"),
                ));
            }
        }

        for (key, member) in map {
            let member_pointer = child_pointer(pointer, key);
            let mut covered = false;

            if let Some(property) = node.properties.get(key) {
                covered = true;
                let path = format!("{}/properties/{}", schema_path, escape_pointer_segment(key));
                self.check(*property, member, &member_pointer, &path, out);
            }

            for (pattern, pattern_schema) in &node.pattern_properties {
                if pattern.is_match(key) {
                    covered = true;
                    let path = format!(
                        "{}/patternProperties/{}",
                        schema_path,
                        escape_pointer_segment(pattern.as_str())
                    );
                    self.check(*pattern_schema, member, &member_pointer, &path, out);
                }
            }

            if !covered {
                match node.additional {
                    Additional::Allowed => {}
                    Additional::Forbidden => out.push(Violation::additional_property(
                        member_pointer.clone(),
                        keyword_path(schema_path, "additionalProperties"),
                    )),
                    Additional::Schema(extra) => {
                        let path = keyword_path(schema_path, "additionalProperties");
                        self.check(extra, member, &member_pointer, &path, out);
                    }
                }
            }

            if let Some(names) = node.property_names {
                let path = keyword_path(schema_path, "propertyNames");
                self.check(names, &Value::String(key.clone()), &member_pointer, &path, out);
            }
        }

        for (key, dependency) in &node.dependencies {
            if !map.contains_key(key) {
                continue;
            }
            let path = format!("{}/dependencies/{}", schema_path, escape_pointer_segment(key));
            match dependency {
                Dependency::Properties(names) => {
                    for name in names.iter().filter(|name| !map.contains_key(*name)) {
                        out.push(Violation::new(
                            child_pointer(pointer, name),
                            path.clone(),
                            format!("required when '{}' is present", key),
                        ));
                    }
                }
                Dependency::Schema(dependent) => self.check(*dependent, value, pointer, &path, out),
            }
        }
    }
}

/// JSON Schema equality: numbers compare by value, so `1` equals `1.0`.
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(key, x)| y.get(key).map_or(false, |y| json_equal(x, y)))
        }
        _ => a == b,
    }
}

fn keyword_path(schema_path: &str, keyword: &str) -> String {
    format!("{}/{}", schema_path, keyword)
}

/// Dotted pointer of an object member
fn child_pointer(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn index_pointer(prefix: &str, index: usize) -> String {
    format!("{}[{}]", prefix, index)
}
