//! Error event processor
//!
//! Error reports arrive as `{"error": {...}}`, either alone or batched.
//! Schema and rule table ship inside the binary.

use std::sync::Arc;

use super::errors::SetupError;
use super::record::EnvelopeTransform;
use super::schema_processor::SchemaProcessor;
use crate::observability::{Event, Logger};
use crate::policy::{PolicyResult, PresencePolicy};
use crate::schema::{EventSchema, SchemaDefinition, SchemaResult};

/// Intake route served by this processor
pub const ROUTE: &str = "/v1/errors";

/// Processor and envelope key name
pub const NAME: &str = "error";

const SCHEMA_SOURCE: &str = include_str!("../../schemas/error.json");
const RULES_SOURCE: &str = include_str!("../../rules/error.json");

/// The compiled error schema bound to its envelope key
pub fn schema() -> SchemaResult<EventSchema> {
    let definition = SchemaDefinition::compile(NAME, SCHEMA_SOURCE)?;
    Ok(EventSchema::new(Arc::new(definition), NAME))
}

/// Exception/log exclusivity and trace correlation rules
pub fn rules() -> PolicyResult<PresencePolicy> {
    PresencePolicy::from_json(RULES_SOURCE)
}

/// Builds the error processor. Failure here must abort startup.
pub fn processor() -> Result<SchemaProcessor, SetupError> {
    let schema = match schema() {
        Ok(schema) => schema,
        Err(err) => {
            Logger::event(
                Event::SchemaCompileFailed,
                &[("schema", NAME), ("code", err.code().code()), ("reason", err.message())],
            );
            return Err(err.into());
        }
    };
    let policy = rules()?;
    let rule_count = policy.rules().len().to_string();
    Logger::event(
        Event::SchemaCompiled,
        &[("schema", NAME), ("rules", rule_count.as_str())],
    );

    Ok(SchemaProcessor::new(
        NAME,
        schema,
        policy,
        Box::new(EnvelopeTransform::new(NAME, NAME)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Processor;

    #[test]
    fn test_embedded_schema_compiles() {
        let schema = schema().unwrap();
        let declared: Vec<String> = schema.declared_paths().into_iter().map(String::from).collect();
        assert!(declared.contains(&"error.context.user.id".to_string()));
        assert!(declared.contains(&"error.exception.stacktrace.filename".to_string()));
        assert!(!declared.contains(&"error".to_string()));
    }

    #[test]
    fn test_embedded_rules_load() {
        let policy = rules().unwrap();
        // exclusivity both ways plus every ordered pair of correlation ids
        assert_eq!(policy.rules().len(), 8);
    }

    #[test]
    fn test_processor_name() {
        assert_eq!(processor().unwrap().name(), "error");
    }
}
