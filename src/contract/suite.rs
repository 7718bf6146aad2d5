//! Contract suite
//!
//! Loads everything a contract names and runs the offline checks in order:
//! 1. samples through the processor (must all pass)
//! 2. consistency of records, field catalog and schema
//! 3. required-key probe
//! 4. keyword indexing limits
//! 5. data validation cases
//!
//! Steps 2-5 report mismatches; they never stop the suite early.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::cases::{run_cases, CaseFailure};
use super::config::ContractConfig;
use super::errors::{ContractError, ContractResult};
use crate::consistency::{check_consistency, ConsistencyReport};
use crate::fields::{FieldCatalog, FieldPath};
use crate::indexing::{IndexingReport, KeywordEnforcer};
use crate::observability::{Event, Logger};
use crate::payload::{parse_document, read_samples, PayloadError};
use crate::policy::{PolicyError, PresencePolicy, RequiredKeyProbe, RequirednessMismatch};
use crate::processor::{EnvelopeTransform, Processor, SchemaProcessor};
use crate::schema::{EventSchema, SchemaDefinition};

/// Outcome of one contract run
#[derive(Debug, Clone, Serialize)]
pub struct ContractReport {
    pub name: String,
    /// Records produced from the samples
    pub records: usize,
    pub consistency: ConsistencyReport,
    /// `None` when the contract configures no probe
    pub requiredness: Option<Vec<RequirednessMismatch>>,
    pub indexing: IndexingReport,
    pub cases: Vec<CaseFailure>,
}

impl ContractReport {
    pub fn is_passing(&self) -> bool {
        self.failed_checks().is_empty()
    }

    /// Names of the checks with at least one mismatch
    pub fn failed_checks(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if !self.consistency.is_consistent() {
            failed.push("consistency");
        }
        if self.requiredness.as_ref().map_or(false, |m| !m.is_empty()) {
            failed.push("requiredness");
        }
        if !self.indexing.is_clean() {
            failed.push("indexing");
        }
        if !self.cases.is_empty() {
            failed.push("cases");
        }
        failed
    }

    pub fn into_result(self) -> ContractResult<Self> {
        if self.is_passing() {
            Ok(self)
        } else {
            Err(ContractError::Failed(Box::new(self)))
        }
    }
}

impl fmt::Display for ContractReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_passing() {
            return write!(f, "all checks passed over {} record(s)", self.records);
        }
        let mut parts = Vec::new();
        if !self.consistency.is_consistent() {
            parts.push(format!("consistency: {}", self.consistency));
        }
        if let Some(mismatches) = self.requiredness.as_ref().filter(|m| !m.is_empty()) {
            let rendered: Vec<String> = mismatches
                .iter()
                .map(|m| {
                    let documented = if m.documented_required { "required" } else { "optional" };
                    format!("{} documented {}", m.field, documented)
                })
                .collect();
            parts.push(format!("requiredness: {}", rendered.join(", ")));
        }
        if !self.indexing.is_clean() {
            parts.push(format!("indexing: {}", self.indexing));
        }
        if !self.cases.is_empty() {
            let rendered: Vec<String> = self.cases.iter().map(ToString::to_string).collect();
            parts.push(format!("cases: {}", rendered.join("; ")));
        }
        write!(f, "{}", parts.join(" | "))
    }
}

/// A loaded contract, ready to run
pub struct ContractSuite {
    config: ContractConfig,
    schema: EventSchema,
    catalog: FieldCatalog,
    processor: SchemaProcessor,
    samples: Vec<Value>,
    full_event: Value,
}

impl ContractSuite {
    /// Loads a contract file and everything it references.
    pub fn load(path: &Path) -> ContractResult<Self> {
        Self::from_config(ContractConfig::load(path)?)
    }

    pub fn from_config(config: ContractConfig) -> ContractResult<Self> {
        let definition = SchemaDefinition::load(&config.schema)?;
        let schema = EventSchema::new(Arc::new(definition), config.event_key.as_str());

        let policy = match &config.rules {
            Some(path) => {
                let source = fs::read_to_string(path).map_err(|e| {
                    PolicyError::Load(format!("{}: {}", path.display(), e))
                })?;
                PresencePolicy::from_json(&source)?
            }
            None => PresencePolicy::new(Vec::new())?,
        };
        let rule_count = policy.rules().len().to_string();
        Logger::event(
            Event::SchemaCompiled,
            &[("schema", schema.definition().name()), ("rules", rule_count.as_str())],
        );

        let catalog = FieldCatalog::load(config.fields.as_slice())?;
        let entry_count = catalog.len().to_string();
        Logger::event(
            Event::CatalogBuilt,
            &[("contract", config.name.as_str()), ("entries", entry_count.as_str())],
        );

        let samples = read_samples(&config.samples)?;
        let full_event = match &config.full_event {
            Some(path) => read_event(path)?,
            None => samples.first().cloned().ok_or(PayloadError::Empty)?,
        };

        let processor = SchemaProcessor::new(
            config.name.as_str(),
            schema.clone(),
            policy,
            Box::new(EnvelopeTransform::new(config.name.as_str(), config.event_key.as_str())),
        );

        Ok(Self {
            config,
            schema,
            catalog,
            processor,
            samples,
            full_event,
        })
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    pub fn schema(&self) -> &EventSchema {
        &self.schema
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Runs every check and collects the results.
    ///
    /// # Errors
    ///
    /// Fails outright when the samples or the full event do not pass the
    /// schema and rules; mismatches found by the checks land in the report.
    pub fn run(&self) -> ContractResult<ContractReport> {
        let name = self.config.name.as_str();
        Logger::event(Event::ContractCheckBegin, &[("contract", name)]);

        let (records, payload_paths) = self.record_paths()?;

        let consistency = check_consistency(
            &self.catalog,
            &self.schema.declared_paths(),
            &payload_paths,
            &self.config.consistency.exceptions(),
        );
        report_check(name, "consistency", consistency.is_consistent(), consistency.mismatch_count());

        let requiredness = match &self.config.probe {
            Some(probe_config) => {
                let probe = RequiredKeyProbe::new(&self.schema, &self.full_event)?;
                let mismatches = probe.check(&probe_config.required_set(), &probe_config.requirements)?;
                report_check(name, "requiredness", mismatches.is_empty(), mismatches.len());
                Some(mismatches)
            }
            None => None,
        };

        let enforcer = KeywordEnforcer::new(&self.schema, &self.full_event, &self.config.indexing.mappings);
        let indexing = enforcer.check_keyword_limits(&self.catalog, &self.config.indexing.exception_set());
        report_check(name, "indexing", indexing.is_clean(), indexing.mismatches.len());

        let cases = run_cases(&self.schema, &self.full_event, &self.config.cases);
        report_check(name, "cases", cases.is_empty(), cases.len());

        let report = ContractReport {
            name: name.to_string(),
            records,
            consistency,
            requiredness,
            indexing,
            cases,
        };
        let failed = report.failed_checks().len().to_string();
        Logger::event(
            Event::ContractCheckComplete,
            &[("contract", name), ("failed_checks", failed.as_str())],
        );
        Ok(report)
    }

    /// Number of records and the union of their key paths
    fn record_paths(&self) -> ContractResult<(usize, BTreeSet<FieldPath>)> {
        let events = self.processor.validate(&batch_bytes(&self.samples)?)?;
        let records = self.processor.transform(&events, Utc::now())?;
        let mut paths = BTreeSet::new();
        for record in &records {
            paths.extend(record.paths());
        }
        Ok((records.len(), paths))
    }
}

fn report_check(contract: &str, check: &str, passed: bool, mismatches: usize) {
    let mismatches = mismatches.to_string();
    let event = if passed {
        Event::ContractCheckPassed
    } else {
        Event::ContractCheckFailed
    };
    Logger::event(
        event,
        &[("contract", contract), ("check", check), ("mismatches", mismatches.as_str())],
    );
}

fn batch_bytes(samples: &[Value]) -> ContractResult<Vec<u8>> {
    serde_json::to_vec(samples).map_err(|e| PayloadError::Malformed(e.to_string()).into())
}

fn read_event(path: &Path) -> ContractResult<Value> {
    let bytes = fs::read(path).map_err(|e| PayloadError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut events = parse_document(&bytes)?;
    if events.len() != 1 {
        return Err(ContractError::config(
            path.display().to_string(),
            format!("expected exactly one event, found {}", events.len()),
        ));
    }
    Ok(events.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::File::create(path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
    }

    /// A small contract; `tweak` edits the config source before writing.
    fn contract(tweak: impl Fn(String) -> String) -> (TempDir, ContractSuite) {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "schemas/span.json",
            r#"{
                "type": "object",
                "properties": {
                    "id": {"type": "string", "maxLength": 1024},
                    "name": {"type": ["string", "null"], "maxLength": 1024},
                    "tags": {
                        "type": ["object", "null"],
                        "patternProperties": {"^[^.*\"]*$": {"type": ["string", "null"], "maxLength": 1024}},
                        "additionalProperties": false,
                        "propertyNames": {"maxLength": 1024}
                    }
                },
                "required": ["id"]
            }"#,
        );
        write(
            &dir,
            "fields/span.json",
            r#"[
                {"name": "@timestamp", "type": "date"},
                {"name": "processor", "type": "group", "fields": [{"name": "name"}, {"name": "event"}]},
                {"name": "span", "type": "group", "fields": [
                    {"name": "id"},
                    {"name": "name"},
                    {"name": "tags", "type": "object", "dynamic": true}
                ]}
            ]"#,
        );
        write(
            &dir,
            "testdata/spans.ndjson",
            "{\"span\": {\"id\": \"a\", \"name\": \"GET /\", \"tags\": {\"k\": \"v\"}}}\n",
        );
        let config = tweak(
            r#"{
                "name": "span",
                "event_key": "span",
                "schema": "schemas/span.json",
                "fields": ["fields/span.json"],
                "samples": "testdata/spans.ndjson",
                "consistency": {
                    "payload_not_in_schema": ["@timestamp", {"group": "processor"}, "span", {"group": "span.tags"}]
                },
                "probe": {"required": ["span", "span.id"]},
                "indexing": {"mappings": [{"template": "span.", "mapping": "span."}]},
                "cases": [{"key": "span.name", "valid": [null], "invalid": [{"schema_path": "/name/type", "values": [1]}]}]
            }"#
            .to_string(),
        );
        write(&dir, "contract.json", &config);
        let suite = ContractSuite::load(&dir.path().join("contract.json")).unwrap();
        (dir, suite)
    }

    #[test]
    fn test_consistent_contract_passes() {
        let (_dir, suite) = contract(|c| c);
        let report = suite.run().unwrap();
        assert!(report.is_passing(), "{}", report);
        assert_eq!(report.records, 1);
        assert_eq!(report.indexing.checked, 3);
        assert_eq!(
            report.indexing.unmapped.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            vec!["processor.event", "processor.name"]
        );
    }

    #[test]
    fn test_missing_exception_fails_consistency() {
        let (_dir, suite) = contract(|c| c.replace(r#""@timestamp", "#, ""));
        let report = suite.run().unwrap();
        assert_eq!(report.failed_checks(), vec!["consistency"]);
        assert_eq!(report.consistency.payload_not_in_schema.len(), 1);
        assert_eq!(report.consistency.payload_not_in_schema[0].as_str(), "@timestamp");

        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("@timestamp"));
    }

    #[test]
    fn test_wrong_requiredness_is_reported() {
        let (_dir, suite) = contract(|c| c.replace(r#"["span", "span.id"]"#, r#"["span", "span.id", "span.name"]"#));
        let report = suite.run().unwrap();
        assert_eq!(report.failed_checks(), vec!["requiredness"]);
        let mismatches = report.requiredness.unwrap();
        assert_eq!(mismatches[0].field.as_str(), "span.name");
    }

    #[test]
    fn test_invalid_sample_aborts_run() {
        let (dir, suite) = contract(|c| c);
        drop(suite);
        write(&dir, "testdata/spans.ndjson", "{\"span\": {\"name\": \"no id\"}}\n");
        let suite = ContractSuite::load(&dir.path().join("contract.json")).unwrap();
        assert!(matches!(suite.run(), Err(ContractError::SampleRejected(_))));
    }

    #[test]
    fn test_missing_schema_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "contract.json",
            r#"{"name": "x", "event_key": "x", "schema": "nope.json", "fields": ["f.json"], "samples": "s.ndjson"}"#,
        );
        assert!(matches!(
            ContractSuite::load(&dir.path().join("contract.json")),
            Err(ContractError::Schema(_))
        ));
    }
}
