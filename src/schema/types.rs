//! Compiled schema representation
//!
//! A compiled schema is an arena of nodes. Nodes refer to each other by
//! `NodeId`, which lets recursive schemas (a property referencing `#`) point
//! back at an ancestor without reference counting.
//!
//! Supported instance types (draft-04):
//! - null, boolean, integer, number, string, array, object

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// JSON Schema primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Boolean,
    /// Numbers without a fractional part
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    /// Parses a `type` keyword entry
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(JsonType::Null),
            "boolean" => Some(JsonType::Boolean),
            "integer" => Some(JsonType::Integer),
            "number" => Some(JsonType::Number),
            "string" => Some(JsonType::String),
            "array" => Some(JsonType::Array),
            "object" => Some(JsonType::Object),
            _ => None,
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }

    /// Returns true if `value` is an instance of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (JsonType::Null, Value::Null) => true,
            (JsonType::Boolean, Value::Bool(_)) => true,
            (JsonType::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().map_or(false, |f| f.fract() == 0.0)
            }
            (JsonType::Number, Value::Number(_)) => true,
            (JsonType::String, Value::String(_)) => true,
            (JsonType::Array, Value::Array(_)) => true,
            (JsonType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }

    /// Returns the most specific type name of an instance
    pub fn of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Index of a node inside a compiled schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A compiled regular expression together with its source text.
///
/// Matching is an unanchored search, as JSON Schema requires.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Handling of object keys not covered by `properties`/`patternProperties`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Additional {
    #[default]
    Allowed,
    Forbidden,
    Schema(NodeId),
}

/// Draft-04 `dependencies` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// The listed properties must be present too
    Properties(Vec<String>),
    /// The whole object must satisfy the schema
    Schema(NodeId),
}

/// One compiled schema object
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    /// Pointer of the node inside the schema source
    pub location: String,
    /// Allowed instance types; empty means any
    pub types: Vec<JsonType>,
    pub enumeration: Option<Vec<Value>>,

    // strings
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Pattern>,

    // numbers
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,

    // arrays
    pub items: Option<NodeId>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,

    // objects
    pub properties: BTreeMap<String, NodeId>,
    pub pattern_properties: Vec<(Pattern, NodeId)>,
    pub additional: Additional,
    pub required: Vec<String>,
    pub dependencies: BTreeMap<String, Dependency>,
    pub property_names: Option<NodeId>,

    // combinators
    pub all_of: Vec<NodeId>,
    pub any_of: Vec<NodeId>,
    pub one_of: Vec<NodeId>,
    pub not: Option<NodeId>,
}

impl SchemaNode {
    /// Human readable list of allowed types, e.g. "string or integer"
    pub fn expected_types(&self) -> String {
        let names: Vec<&str> = self.types.iter().map(JsonType::type_name).collect();
        names.join(" or ")
    }

    /// Subschemas applied to the same instance (no descent into children)
    pub fn in_place_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        let dependency_schemas = self.dependencies.values().filter_map(|dep| match dep {
            Dependency::Schema(id) => Some(*id),
            Dependency::Properties(_) => None,
        });
        self.all_of
            .iter()
            .chain(self.any_of.iter())
            .chain(self.one_of.iter())
            .copied()
            .chain(self.not)
            .chain(dependency_schemas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_matching() {
        assert!(JsonType::Integer.matches(&json!(1496170422281000u64)));
        assert!(JsonType::Integer.matches(&json!(-3)));
        assert!(JsonType::Integer.matches(&json!(2.0)));
        assert!(!JsonType::Integer.matches(&json!(2.5)));
        assert!(!JsonType::Integer.matches(&json!("1496170422281000")));
    }

    #[test]
    fn test_number_accepts_integers() {
        assert!(JsonType::Number.matches(&json!(3)));
        assert!(JsonType::Number.matches(&json!(123.45)));
        assert!(!JsonType::Number.matches(&json!(true)));
    }

    #[test]
    fn test_type_of_instance() {
        assert_eq!(JsonType::of(&json!({})), "object");
        assert_eq!(JsonType::of(&json!(1.5)), "number");
        assert_eq!(JsonType::of(&json!(7)), "integer");
        assert_eq!(JsonType::of(&Value::Null), "null");
    }

    #[test]
    fn test_parse_type_names() {
        assert_eq!(JsonType::parse("boolean"), Some(JsonType::Boolean));
        assert_eq!(JsonType::parse("bool"), None);
    }

    #[test]
    fn test_pattern_is_unanchored_search() {
        let pattern = Pattern::new("[0-9]+").unwrap();
        assert!(pattern.is_match("abc123def"));
        assert!(!pattern.is_match("abc"));
        assert_eq!(pattern.as_str(), "[0-9]+");
    }

    #[test]
    fn test_expected_types() {
        let node = SchemaNode {
            types: vec![JsonType::String, JsonType::Integer],
            ..SchemaNode::default()
        };
        assert_eq!(node.expected_types(), "string or integer");
    }
}
