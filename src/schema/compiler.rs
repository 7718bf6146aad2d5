//! Compiles JSON Schema source into a node arena
//!
//! Compilation happens once per schema. Every structural problem is reported
//! here so that validation never meets a malformed node:
//! - nodes must be objects
//! - the root must declare `type`
//! - keyword shapes are checked (`type`, `required`, `properties`, limits,
//!   `enum`, `items`, combinators)
//! - patterns must compile
//! - `$ref` must be local, resolvable and must not loop

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use super::errors::{SchemaError, SchemaResult};
use super::types::{Additional, Dependency, JsonType, NodeId, Pattern, SchemaNode};

/// Output of a successful compilation
pub(crate) struct Compiled {
    pub nodes: Vec<SchemaNode>,
    pub root: NodeId,
}

pub(crate) struct Compiler<'a> {
    name: &'a str,
    source: &'a Value,
    nodes: Vec<SchemaNode>,
    by_location: HashMap<String, NodeId>,
}

impl<'a> Compiler<'a> {
    pub fn compile(name: &'a str, source: &'a Value) -> SchemaResult<Compiled> {
        let root = source
            .as_object()
            .ok_or_else(|| SchemaError::malformed(name, "", "schema root must be an object"))?;
        if !root.contains_key("type") {
            return Err(SchemaError::missing_keyword(name, "", "type"));
        }

        let mut compiler = Self {
            name,
            source,
            nodes: Vec::new(),
            by_location: HashMap::new(),
        };
        let root = compiler.node_at("")?;
        compiler.check_in_place_cycles()?;

        Ok(Compiled {
            nodes: compiler.nodes,
            root,
        })
    }

    /// Compiles (or reuses) the node at a JSON pointer, following `$ref`.
    fn node_at(&mut self, location: &str) -> SchemaResult<NodeId> {
        let location = self.resolve_refs(location)?;
        if let Some(id) = self.by_location.get(&location) {
            return Ok(*id);
        }

        // Reserve the slot first so recursive references find it.
        let id = NodeId(self.nodes.len());
        self.nodes.push(SchemaNode::default());
        self.by_location.insert(location.clone(), id);

        let value = self.lookup(&location)?;
        let node = self.build(&location, value)?;
        self.nodes[id.0] = node;
        Ok(id)
    }

    fn lookup(&self, location: &str) -> SchemaResult<&'a Value> {
        let source: &'a Value = self.source;
        source
            .pointer(location)
            .ok_or_else(|| SchemaError::malformed(self.name, location, "location does not exist"))
    }

    /// Follows a chain of `$ref`s until a concrete node is reached.
    fn resolve_refs(&self, location: &str) -> SchemaResult<String> {
        let mut current = location.to_string();
        let mut chain: Vec<String> = Vec::new();

        loop {
            let value = self.lookup(&current)?;
            let reference = match value.get("$ref") {
                None => return Ok(current),
                Some(Value::String(reference)) => reference,
                Some(_) => {
                    return Err(SchemaError::invalid_keyword(
                        self.name,
                        &current,
                        "$ref",
                        "must be a string",
                    ))
                }
            };

            if chain.contains(&current) {
                chain.push(current);
                return Err(SchemaError::cyclic_ref(self.name, &chain));
            }
            let target = self.ref_target(&current, reference)?;
            chain.push(current);
            current = target;
        }
    }

    fn ref_target(&self, location: &str, reference: &str) -> SchemaResult<String> {
        let pointer = reference
            .strip_prefix('#')
            .filter(|p| p.is_empty() || p.starts_with('/'))
            .ok_or_else(|| SchemaError::unresolved_ref(self.name, location, reference))?;
        let source: &'a Value = self.source;
        if source.pointer(pointer).is_none() {
            return Err(SchemaError::unresolved_ref(self.name, location, reference));
        }
        Ok(pointer.to_string())
    }

    fn build(&mut self, location: &str, value: &'a Value) -> SchemaResult<SchemaNode> {
        let obj = value
            .as_object()
            .ok_or_else(|| SchemaError::malformed(self.name, location, "schema must be an object"))?;

        let mut node = SchemaNode {
            location: location.to_string(),
            ..SchemaNode::default()
        };

        if let Some(types) = obj.get("type") {
            node.types = self.parse_types(location, types)?;
        }
        if let Some(values) = obj.get("enum") {
            match values.as_array() {
                Some(values) if !values.is_empty() => node.enumeration = Some(values.clone()),
                _ => return Err(self.invalid(location, "enum", "must be a non-empty array")),
            }
        }

        node.min_length = self.parse_limit(location, obj, "minLength")?;
        node.max_length = self.parse_limit(location, obj, "maxLength")?;
        node.min_items = self.parse_limit(location, obj, "minItems")?;
        node.max_items = self.parse_limit(location, obj, "maxItems")?;
        node.minimum = self.parse_number(location, obj, "minimum")?;
        node.maximum = self.parse_number(location, obj, "maximum")?;

        if let Some(pattern) = obj.get("pattern") {
            let source = pattern
                .as_str()
                .ok_or_else(|| self.invalid(location, "pattern", "must be a string"))?;
            node.pattern = Some(self.pattern(location, source)?);
        }

        if let Some(items) = obj.get("items") {
            if !items.is_object() {
                return Err(self.invalid(location, "items", "only the single-schema form is supported"));
            }
            node.items = Some(self.node_at(&child(location, &["items"]))?);
        }

        if let Some(properties) = obj.get("properties") {
            let properties = properties
                .as_object()
                .ok_or_else(|| self.invalid(location, "properties", "must be an object"))?;
            for key in properties.keys() {
                let id = self.node_at(&child(location, &["properties", key]))?;
                node.properties.insert(key.clone(), id);
            }
        }

        if let Some(patterns) = obj.get("patternProperties") {
            let patterns = patterns
                .as_object()
                .ok_or_else(|| self.invalid(location, "patternProperties", "must be an object"))?;
            for key in patterns.keys() {
                let pattern = self.pattern(location, key)?;
                let id = self.node_at(&child(location, &["patternProperties", key]))?;
                node.pattern_properties.push((pattern, id));
            }
        }

        node.additional = match obj.get("additionalProperties") {
            None | Some(Value::Bool(true)) => Additional::Allowed,
            Some(Value::Bool(false)) => Additional::Forbidden,
            Some(Value::Object(_)) => {
                Additional::Schema(self.node_at(&child(location, &["additionalProperties"]))?)
            }
            Some(_) => {
                return Err(self.invalid(location, "additionalProperties", "must be a boolean or a schema"))
            }
        };

        if let Some(required) = obj.get("required") {
            node.required = self.string_list(location, "required", required)?;
        }

        if let Some(dependencies) = obj.get("dependencies") {
            node.dependencies = self.parse_dependencies(location, dependencies)?;
        }

        if let Some(names) = obj.get("propertyNames") {
            if !names.is_object() {
                return Err(self.invalid(location, "propertyNames", "must be a schema"));
            }
            node.property_names = Some(self.node_at(&child(location, &["propertyNames"]))?);
        }

        node.all_of = self.parse_branches(location, obj, "allOf")?;
        node.any_of = self.parse_branches(location, obj, "anyOf")?;
        node.one_of = self.parse_branches(location, obj, "oneOf")?;
        if let Some(not) = obj.get("not") {
            if !not.is_object() {
                return Err(self.invalid(location, "not", "must be a schema"));
            }
            node.not = Some(self.node_at(&child(location, &["not"]))?);
        }

        Ok(node)
    }

    fn parse_types(&self, location: &str, types: &Value) -> SchemaResult<Vec<JsonType>> {
        let names: Vec<&str> = match types {
            Value::String(name) => vec![name.as_str()],
            Value::Array(names) if !names.is_empty() => names
                .iter()
                .map(|name| {
                    name.as_str()
                        .ok_or_else(|| self.invalid(location, "type", "entries must be strings"))
                })
                .collect::<SchemaResult<_>>()?,
            _ => return Err(self.invalid(location, "type", "must be a string or a non-empty array")),
        };

        names
            .into_iter()
            .map(|name| {
                JsonType::parse(name)
                    .ok_or_else(|| self.invalid(location, "type", format!("unknown type '{}'", name)))
            })
            .collect()
    }

    fn parse_limit(
        &self,
        location: &str,
        obj: &Map<String, Value>,
        keyword: &str,
    ) -> SchemaResult<Option<usize>> {
        match obj.get(keyword) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .map(|limit| Some(limit as usize))
                .ok_or_else(|| self.invalid(location, keyword, "must be a non-negative integer")),
        }
    }

    fn parse_number(
        &self,
        location: &str,
        obj: &Map<String, Value>,
        keyword: &str,
    ) -> SchemaResult<Option<f64>> {
        match obj.get(keyword) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(location, keyword, "must be a number")),
        }
    }

    fn string_list(&self, location: &str, keyword: &str, value: &Value) -> SchemaResult<Vec<String>> {
        let entries = value
            .as_array()
            .filter(|entries| !entries.is_empty())
            .ok_or_else(|| self.invalid(location, keyword, "must be a non-empty array of strings"))?;
        entries
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(location, keyword, "entries must be strings"))
            })
            .collect()
    }

    fn parse_dependencies(
        &mut self,
        location: &str,
        value: &'a Value,
    ) -> SchemaResult<BTreeMap<String, Dependency>> {
        let entries = value
            .as_object()
            .ok_or_else(|| self.invalid(location, "dependencies", "must be an object"))?;
        let mut dependencies = BTreeMap::new();
        for (key, dependency) in entries {
            let dependency = match dependency {
                Value::Array(_) => {
                    Dependency::Properties(self.string_list(location, "dependencies", dependency)?)
                }
                Value::Object(_) => {
                    Dependency::Schema(self.node_at(&child(location, &["dependencies", key]))?)
                }
                _ => {
                    return Err(self.invalid(
                        location,
                        "dependencies",
                        format!("entry '{}' must be an array or a schema", key),
                    ))
                }
            };
            dependencies.insert(key.clone(), dependency);
        }
        Ok(dependencies)
    }

    fn parse_branches(
        &mut self,
        location: &str,
        obj: &Map<String, Value>,
        keyword: &str,
    ) -> SchemaResult<Vec<NodeId>> {
        let Some(branches) = obj.get(keyword) else {
            return Ok(Vec::new());
        };
        let count = branches
            .as_array()
            .filter(|branches| !branches.is_empty())
            .map(Vec::len)
            .ok_or_else(|| self.invalid(location, keyword, "must be a non-empty array of schemas"))?;
        (0..count)
            .map(|i| self.node_at(&child(location, &[keyword, &i.to_string()])))
            .collect()
    }

    fn pattern(&self, location: &str, source: &str) -> SchemaResult<Pattern> {
        Pattern::new(source)
            .map_err(|e| SchemaError::invalid_pattern(self.name, location, source, e.to_string()))
    }

    fn invalid(&self, location: &str, keyword: &str, reason: impl Into<String>) -> SchemaError {
        SchemaError::invalid_keyword(self.name, location, keyword, reason)
    }

    /// Rejects loops through combinators that never descend into the
    /// instance, e.g. `{"allOf": [{"$ref": "#"}]}`. Validating such a schema
    /// would not terminate.
    fn check_in_place_cycles(&self) -> SchemaResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        fn visit(
            compiler: &Compiler<'_>,
            id: NodeId,
            marks: &mut [Mark],
            stack: &mut Vec<NodeId>,
        ) -> SchemaResult<()> {
            match marks[id.0] {
                Mark::Done => return Ok(()),
                Mark::Active => {
                    let start = stack.iter().position(|n| *n == id).unwrap_or_default();
                    let mut chain: Vec<String> = stack[start..]
                        .iter()
                        .map(|n| compiler.nodes[n.0].location.clone())
                        .collect();
                    chain.push(compiler.nodes[id.0].location.clone());
                    return Err(SchemaError::cyclic_ref(compiler.name, &chain));
                }
                Mark::Unvisited => {}
            }
            marks[id.0] = Mark::Active;
            stack.push(id);
            for next in compiler.nodes[id.0].in_place_children() {
                visit(compiler, next, marks, stack)?;
            }
            stack.pop();
            marks[id.0] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut stack = Vec::new();
        for index in 0..self.nodes.len() {
            visit(self, NodeId(index), &mut marks, &mut stack)?;
        }
        Ok(())
    }
}

/// Appends escaped JSON pointer segments to a location.
fn child(location: &str, segments: &[&str]) -> String {
    let mut out = location.to_string();
    for segment in segments {
        out.push('/');
        out.push_str(&escape_pointer_segment(segment));
    }
    out
}

/// Escapes `~` and `/` per RFC 6901.
pub(crate) fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
