//! Key sets of concrete payloads
//!
//! Flattening rules:
//! - every object key yields a path, intermediate objects included
//! - arrays are transparent: elements contribute to the array's own path
//! - a key whose value is `null` counts as absent

use serde_json::Value;
use std::collections::BTreeSet;

use crate::fields::FieldPath;

/// Flattens one document into its sorted key paths.
pub fn flatten_keys(document: &Value) -> BTreeSet<FieldPath> {
    let mut out = BTreeSet::new();
    collect(&FieldPath::root(), document, &mut out);
    out
}

/// Union of the key paths of several documents.
pub fn flatten_all<'a>(documents: impl IntoIterator<Item = &'a Value>) -> BTreeSet<FieldPath> {
    let mut out = BTreeSet::new();
    for document in documents {
        collect(&FieldPath::root(), document, &mut out);
    }
    out
}

fn collect(prefix: &FieldPath, value: &Value, out: &mut BTreeSet<FieldPath>) {
    match value {
        Value::Object(map) => {
            for (key, member) in map {
                if member.is_null() {
                    continue;
                }
                let path = prefix.child(key);
                collect(&path, member, out);
                out.insert(path);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(prefix, item, out);
            }
        }
        _ => {}
    }
}
