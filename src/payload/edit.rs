//! Editing documents by dotted path
//!
//! Used by the offline checks to derive variants of a sample event. Arrays
//! along the path are handled the way flattening sees them: placing a value
//! uses the first element, removing a key removes it from every element.

use serde_json::{Map, Value};

use super::errors::{PayloadError, PayloadResult};

/// Places `value` at a dotted path, creating missing intermediate objects.
///
/// Intermediates that exist but are neither objects nor arrays are replaced
/// by empty objects.
pub fn set_path(document: &mut Value, path: &str, value: Value) -> PayloadResult<()> {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(unreachable(path, "empty path")),
    };

    let mut current = document;
    for segment in parents {
        current = match first_element(current) {
            Value::Object(map) => {
                let entry = map.entry(segment.to_string()).or_insert(Value::Null);
                if !entry.is_object() && !entry.is_array() {
                    *entry = Value::Object(Map::new());
                }
                entry
            }
            _ => return Err(unreachable(path, &format!("'{}' has no object parent", segment))),
        };
    }

    match first_element(current) {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        _ => Err(unreachable(path, "parent is not an object")),
    }
}

/// Removes the key at a dotted path from every array element on the way.
/// Returns true if anything was removed.
pub fn remove_path(document: &mut Value, path: &str) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    remove_at(document, &segments)
}

fn remove_at(value: &mut Value, segments: &[&str]) -> bool {
    match value {
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |removed, item| remove_at(item, segments) || removed),
        Value::Object(map) => match segments {
            [] => false,
            [last] => map.remove(*last).is_some(),
            [first, rest @ ..] => map
                .get_mut(*first)
                .map_or(false, |child| remove_at(child, rest)),
        },
        _ => false,
    }
}

fn first_element(value: &mut Value) -> &mut Value {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                items.push(Value::Object(Map::new()));
            }
            &mut items[0]
        }
        other => other,
    }
}

fn unreachable(path: &str, reason: &str) -> PayloadError {
    PayloadError::Unreachable {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_creates_intermediates() {
        let mut doc = json!({"error": {"id": "a"}});
        set_path(&mut doc, "error.context.user.id", json!("u1")).unwrap();
        assert_eq!(doc, json!({"error": {"id": "a", "context": {"user": {"id": "u1"}}}}));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut doc = json!({"error": {"context": null}});
        set_path(&mut doc, "error.context.tags", json!({})).unwrap();
        assert_eq!(doc, json!({"error": {"context": {"tags": {}}}}));
    }

    #[test]
    fn test_set_uses_first_array_element() {
        let mut doc = json!({"frames": [{"lineno": 1}, {"lineno": 2}]});
        set_path(&mut doc, "frames.filename", json!("a.rs")).unwrap();
        assert_eq!(doc, json!({"frames": [{"lineno": 1, "filename": "a.rs"}, {"lineno": 2}]}));
    }

    #[test]
    fn test_set_on_non_object_root_fails() {
        let mut doc = json!("text");
        assert!(matches!(
            set_path(&mut doc, "a", json!(1)),
            Err(PayloadError::Unreachable { .. })
        ));
    }

    #[test]
    fn test_remove_from_every_element() {
        let mut doc = json!({"frames": [{"lineno": 1, "filename": "a"}, {"filename": "b"}]});
        assert!(remove_path(&mut doc, "frames.filename"));
        assert_eq!(doc, json!({"frames": [{"lineno": 1}, {}]}));
        assert!(!remove_path(&mut doc, "frames.filename"));
    }

    #[test]
    fn test_remove_missing_path() {
        let mut doc = json!({"error": {"log": {"message": "m"}}});
        assert!(!remove_path(&mut doc, "error.exception.message"));
        assert!(remove_path(&mut doc, "error.log"));
        assert_eq!(doc, json!({"error": {}}));
    }
}
