//! Contract configuration
//!
//! One contract file describes one event type: where its schema, rule
//! table, field templates and samples live, plus the exceptions each
//! offline check documents. Relative paths resolve against the directory
//! holding the config file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::cases::DataCase;
use super::errors::{ContractError, ContractResult};
use crate::consistency::ConsistencyExceptions;
use crate::fields::{Member, NamedSet};
use crate::indexing::FieldMapping;
use crate::observability::{Event, Logger};
use crate::policy::Requirement;

/// Contract file structure
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractConfig {
    /// Processor name stamped on records
    pub name: String,

    /// Intake route, informational
    #[serde(default)]
    pub route: Option<String>,

    /// Top-level key holding the event
    pub event_key: String,

    pub schema: PathBuf,

    /// Presence rule table (optional, defaults to no rules)
    #[serde(default)]
    pub rules: Option<PathBuf>,

    /// Field template files merged into one catalog
    pub fields: Vec<PathBuf>,

    /// NDJSON samples that must pass the processor
    pub samples: PathBuf,

    /// Event carrying every optional key; defaults to the first sample
    #[serde(default)]
    pub full_event: Option<PathBuf>,

    #[serde(default)]
    pub consistency: ConsistencyConfig,

    /// Required-key probe (skipped when absent)
    #[serde(default)]
    pub probe: Option<ProbeConfig>,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub cases: Vec<DataCase>,
}

/// Documented exceptions per consistency comparison
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsistencyConfig {
    #[serde(default)]
    pub payload_not_in_fields: Vec<Member>,
    #[serde(default)]
    pub fields_not_in_payload: Vec<Member>,
    #[serde(default)]
    pub payload_not_in_schema: Vec<Member>,
    #[serde(default)]
    pub schema_not_in_payload: Vec<Member>,
}

impl ConsistencyConfig {
    pub fn exceptions(&self) -> ConsistencyExceptions {
        ConsistencyExceptions {
            payload_not_in_fields: named("payload_not_in_fields", &self.payload_not_in_fields),
            fields_not_in_payload: named("fields_not_in_payload", &self.fields_not_in_payload),
            payload_not_in_schema: named("payload_not_in_schema", &self.payload_not_in_schema),
            schema_not_in_payload: named("schema_not_in_payload", &self.schema_not_in_payload),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// Keys documented as required
    #[serde(default)]
    pub required: Vec<Member>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

impl ProbeConfig {
    pub fn required_set(&self) -> NamedSet {
        named("required", &self.required)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexingConfig {
    /// Catalog fields exempt from limit checks
    #[serde(default)]
    pub exceptions: Vec<Member>,
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
}

impl IndexingConfig {
    pub fn exception_set(&self) -> NamedSet {
        named("keyword_exceptions", &self.exceptions)
    }
}

fn named(name: &str, members: &[Member]) -> NamedSet {
    NamedSet::new(name, members.iter().cloned())
}

impl ContractConfig {
    /// Load a contract from file and resolve its paths
    pub fn load(path: &Path) -> ContractResult<Self> {
        let location = path.display().to_string();
        let content = fs::read_to_string(path)
            .map_err(|e| ContractError::config(&location, format!("Failed to read config: {}", e)))?;

        let mut config: ContractConfig = serde_json::from_str(&content)
            .map_err(|e| ContractError::config(&location, format!("Invalid config JSON: {}", e)))?;

        config
            .validate()
            .map_err(|reason| ContractError::config(&location, reason))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);

        Logger::event(
            Event::ConfigLoaded,
            &[("path", location.as_str()), ("contract", config.name.as_str())],
        );
        Ok(config)
    }

    /// Parse a contract from a string; paths stay as written.
    pub fn from_json(source: &str) -> ContractResult<Self> {
        let config: ContractConfig = serde_json::from_str(source)
            .map_err(|e| ContractError::config("<inline>", format!("Invalid config JSON: {}", e)))?;
        config
            .validate()
            .map_err(|reason| ContractError::config("<inline>", reason))?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.event_key.is_empty() || self.event_key.contains('.') {
            return Err(format!(
                "event_key '{}' must be a single non-empty key",
                self.event_key
            ));
        }
        if let Some(route) = &self.route {
            if !route.starts_with('/') {
                return Err(format!("route '{}' must start with '/'", route));
            }
        }
        if self.fields.is_empty() {
            return Err("at least one field template file is required".into());
        }

        let prefix = format!("{}.", self.event_key);
        for case in &self.cases {
            if !case.key.as_str().starts_with(&prefix) {
                return Err(format!(
                    "case key '{}' is not below '{}'",
                    case.key, self.event_key
                ));
            }
            if case.valid.is_empty() && case.invalid.is_empty() {
                return Err(format!("case '{}' lists no values", case.key));
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.schema);
        if let Some(rules) = self.rules.as_mut() {
            resolve(rules);
        }
        self.fields.iter_mut().for_each(resolve);
        resolve(&mut self.samples);
        if let Some(full_event) = self.full_event.as_mut() {
            resolve(full_event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"{
        "name": "error",
        "event_key": "error",
        "schema": "schemas/error.json",
        "fields": ["fields/error.json"],
        "samples": "/data/errors.ndjson"
    }"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = ContractConfig::from_json(MINIMAL).unwrap();
        assert!(config.rules.is_none());
        assert!(config.probe.is_none());
        assert!(config.cases.is_empty());
        assert!(config.consistency.exceptions().payload_not_in_schema.is_empty());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contract.json");
        fs::File::create(&path)
            .unwrap()
            .write_all(MINIMAL.as_bytes())
            .unwrap();

        let config = ContractConfig::load(&path).unwrap();
        assert_eq!(config.schema, dir.path().join("schemas/error.json"));
        assert_eq!(config.fields[0], dir.path().join("fields/error.json"));
        assert_eq!(config.samples, PathBuf::from("/data/errors.ndjson"));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let source = MINIMAL.replace("\"name\"", "\"nmae\": \"x\", \"name\"");
        assert!(matches!(
            ContractConfig::from_json(&source),
            Err(ContractError::Config { .. })
        ));
    }

    #[test]
    fn test_rejects_dotted_event_key() {
        let source = MINIMAL.replace("\"event_key\": \"error\"", "\"event_key\": \"error.log\"");
        let err = ContractConfig::from_json(&source).unwrap_err();
        assert!(err.to_string().contains("event_key"));
    }

    #[test]
    fn test_rejects_case_outside_event() {
        let source = MINIMAL.replace(
            "\"samples\"",
            "\"cases\": [{\"key\": \"transaction.id\", \"valid\": [\"x\"]}], \"samples\"",
        );
        let err = ContractConfig::from_json(&source).unwrap_err();
        assert!(err.to_string().contains("transaction.id"));
    }

    #[test]
    fn test_exception_members_parse_groups() {
        let source = MINIMAL.replace(
            "\"samples\"",
            r#""consistency": {"payload_not_in_schema": ["@timestamp", {"group": "processor"}]}, "samples""#,
        );
        let config = ContractConfig::from_json(&source).unwrap();
        let exceptions = config.consistency.exceptions();
        assert!(exceptions.payload_not_in_schema.contains("@timestamp"));
        assert!(exceptions.payload_not_in_schema.contains("processor.name"));
        assert!(!exceptions.payload_not_in_schema.contains("processors"));
    }

    #[test]
    fn test_missing_file() {
        let err = ContractConfig::load(Path::new("/nonexistent/contract.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
