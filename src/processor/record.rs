//! Normalized records and the transform seam

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::errors::{ProcessError, ProcessResult};
use crate::fields::FieldPath;
use crate::payload::flatten_keys;

/// A flat, indexable event produced from one validated payload event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl NormalizedRecord {
    pub fn new(timestamp: DateTime<Utc>, fields: Map<String, Value>) -> Self {
        Self { timestamp, fields }
    }

    /// The record as the JSON object handed to the backend
    pub fn to_value(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert(
            "@timestamp".into(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        Value::Object(object)
    }

    /// Key paths of the record, `@timestamp` included
    pub fn paths(&self) -> BTreeSet<FieldPath> {
        flatten_keys(&self.to_value())
    }
}

/// Turns one validated event into zero or more records.
///
/// Implementations only see events that passed schema and policy checks.
pub trait Transform: Send + Sync {
    fn transform(
        &self,
        event: &Value,
        index: usize,
        received_at: DateTime<Utc>,
    ) -> ProcessResult<Vec<NormalizedRecord>>;
}

/// Converts epoch microseconds to a UTC time.
pub fn timestamp_from_micros(micros: i64) -> Option<DateTime<Utc>> {
    let seconds = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    Utc.timestamp_opt(seconds, nanos).single()
}

/// Epoch microseconds of a JSON number; integral floats are accepted.
fn micros_of(value: &Value) -> Option<i64> {
    if let Some(micros) = value.as_i64() {
        return Some(micros);
    }
    let micros = value.as_f64()?;
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if micros.fract() == 0.0 && micros >= i64::MIN as f64 && micros < i64::MAX as f64 {
        Some(micros as i64)
    } else {
        None
    }
}

/// Keeps the event's own object under its envelope key and stamps it.
///
/// The record carries `processor.name`/`processor.event` and takes
/// `@timestamp` from `<key>.timestamp` (epoch microseconds), falling back
/// to the time the request was received.
pub struct EnvelopeTransform {
    processor: String,
    event_key: String,
}

impl EnvelopeTransform {
    pub fn new(processor: impl Into<String>, event_key: impl Into<String>) -> Self {
        Self {
            processor: processor.into(),
            event_key: event_key.into(),
        }
    }
}

impl Transform for EnvelopeTransform {
    fn transform(
        &self,
        event: &Value,
        index: usize,
        received_at: DateTime<Utc>,
    ) -> ProcessResult<Vec<NormalizedRecord>> {
        let inner = event
            .get(&self.event_key)
            .and_then(Value::as_object)
            .ok_or_else(|| ProcessError::Transform {
                index,
                reason: format!("'{}' is not an object", self.event_key),
            })?;

        let timestamp = match inner.get("timestamp") {
            None | Some(Value::Null) => received_at,
            Some(value) => micros_of(value)
                .and_then(timestamp_from_micros)
                .ok_or_else(|| ProcessError::Transform {
                    index,
                    reason: format!("timestamp {} is not a representable microsecond count", value),
                })?,
        };

        let mut processor = Map::new();
        processor.insert("name".into(), Value::String(self.processor.clone()));
        processor.insert("event".into(), Value::String(self.event_key.clone()));

        let mut fields = Map::new();
        fields.insert("processor".into(), Value::Object(processor));
        fields.insert(self.event_key.clone(), Value::Object(inner.clone()));

        Ok(vec![NormalizedRecord::new(timestamp, fields)])
    }
}
