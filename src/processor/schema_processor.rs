//! Processor trait and the schema-backed implementation
//!
//! Pipeline per request:
//! bytes -> parse -> schema -> presence policy -> transform -> records
//!
//! A batch is all or nothing: the first rejected event rejects the request.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::errors::{ProcessError, ProcessResult};
use super::record::{NormalizedRecord, Transform};
use crate::observability::{Event, Logger};
use crate::payload::parse_document;
use crate::policy::PresencePolicy;
use crate::schema::EventSchema;

/// Validates and transforms the payloads of one intake route.
pub trait Processor: Send + Sync {
    fn name(&self) -> &str;

    /// Decodes and checks a request body, returning its events.
    fn validate(&self, bytes: &[u8]) -> ProcessResult<Vec<Value>>;

    /// Transforms already validated events.
    fn transform(&self, events: &[Value], received_at: DateTime<Utc>) -> ProcessResult<Vec<NormalizedRecord>>;

    fn process(&self, bytes: &[u8], received_at: DateTime<Utc>) -> ProcessResult<Vec<NormalizedRecord>> {
        let events = self.validate(bytes)?;
        self.transform(&events, received_at)
    }
}

/// A processor defined by a schema, a rule table and a transform
pub struct SchemaProcessor {
    name: String,
    schema: EventSchema,
    policy: PresencePolicy,
    transform: Box<dyn Transform>,
}

impl SchemaProcessor {
    pub fn new(
        name: impl Into<String>,
        schema: EventSchema,
        policy: PresencePolicy,
        transform: Box<dyn Transform>,
    ) -> Self {
        Self {
            name: name.into(),
            schema,
            policy,
            transform,
        }
    }

    pub fn schema(&self) -> &EventSchema {
        &self.schema
    }

    pub fn policy(&self) -> &PresencePolicy {
        &self.policy
    }

    fn check_event(&self, index: usize, event: &Value) -> ProcessResult<()> {
        let violations = self.schema.violations(event);
        if !violations.is_empty() {
            return Err(ProcessError::Validation {
                processor: self.name.clone(),
                index,
                violations,
            });
        }

        let violations = self.policy.evaluate(event);
        if !violations.is_empty() {
            return Err(ProcessError::Policy {
                processor: self.name.clone(),
                index,
                violations,
            });
        }
        Ok(())
    }
}

impl Processor for SchemaProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, bytes: &[u8]) -> ProcessResult<Vec<Value>> {
        let result = parse_document(bytes)
            .map_err(ProcessError::from)
            .and_then(|events| {
                for (index, event) in events.iter().enumerate() {
                    self.check_event(index, event)?;
                }
                Ok(events)
            });

        match &result {
            Ok(events) => {
                let count = events.len().to_string();
                Logger::event(
                    Event::PayloadAccepted,
                    &[("processor", self.name.as_str()), ("events", count.as_str())],
                );
            }
            Err(err) => {
                let reason = err.to_string();
                Logger::event(
                    Event::PayloadRejected,
                    &[
                        ("processor", self.name.as_str()),
                        ("kind", err.kind()),
                        ("reason", reason.as_str()),
                    ],
                );
            }
        }
        result
    }

    fn transform(&self, events: &[Value], received_at: DateTime<Utc>) -> ProcessResult<Vec<NormalizedRecord>> {
        let mut records = Vec::new();
        for (index, event) in events.iter().enumerate() {
            records.extend(self.transform.transform(event, index, received_at)?);
        }
        Ok(records)
    }
}
