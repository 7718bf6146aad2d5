//! Decoding raw intake bytes into events
//!
//! Accepted shapes:
//! - a single JSON object
//! - an array of objects (batched intake)
//! - NDJSON, one object per line, for sample files

use serde_json::Value;
use std::fs;
use std::path::Path;

use super::errors::{PayloadError, PayloadResult};
use crate::schema::JsonType;

/// Decodes a request body into its events.
///
/// Nothing is returned unless every event decodes; a batch is never
/// partially accepted.
pub fn parse_document(bytes: &[u8]) -> PayloadResult<Vec<Value>> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| PayloadError::Malformed(e.to_string()))?;
    match value {
        Value::Object(_) => Ok(vec![value]),
        Value::Array(items) => {
            if items.is_empty() {
                return Err(PayloadError::Empty);
            }
            for (i, item) in items.iter().enumerate() {
                expect_object(item, || format!("[{}]", i))?;
            }
            Ok(items)
        }
        other => Err(PayloadError::NotAnObject {
            location: "$root".into(),
            actual: JsonType::of(&other).into(),
        }),
    }
}

/// Decodes newline delimited JSON. Blank lines are skipped.
pub fn parse_ndjson(source: &str) -> PayloadResult<Vec<Value>> {
    let mut events = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: Value =
            serde_json::from_str(line).map_err(|e| PayloadError::MalformedLine {
                line: index + 1,
                reason: e.to_string(),
            })?;
        expect_object(&event, || format!("line {}", index + 1))?;
        events.push(event);
    }
    if events.is_empty() {
        return Err(PayloadError::Empty);
    }
    Ok(events)
}

/// Reads a sample file in NDJSON format.
pub fn read_samples(path: &Path) -> PayloadResult<Vec<Value>> {
    let content = fs::read_to_string(path).map_err(|e| PayloadError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_ndjson(&content)
}

fn expect_object(value: &Value, location: impl FnOnce() -> String) -> PayloadResult<()> {
    if value.is_object() {
        Ok(())
    } else {
        Err(PayloadError::NotAnObject {
            location: location(),
            actual: JsonType::of(value).into(),
        })
    }
}
