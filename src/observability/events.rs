//! Observability events for faultgate
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
///
/// These cover:
/// - Startup (config, schema compilation, processor table)
/// - Intake (accepted and rejected payloads)
/// - Offline contract checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Startup
    /// Contract configuration loaded
    ConfigLoaded,
    /// Schema compiled
    SchemaCompiled,
    /// Schema failed to compile (FATAL)
    SchemaCompileFailed,
    /// Field catalog built from templates
    CatalogBuilt,
    /// Processor added to the routing table
    ProcessorRegistered,

    // Intake
    /// Payload passed validation and policy
    PayloadAccepted,
    /// Payload rejected (parse, schema or policy)
    PayloadRejected,

    // Contract checks
    /// Contract suite started
    ContractCheckBegin,
    /// One contract check passed
    ContractCheckPassed,
    /// One contract check failed
    ContractCheckFailed,
    /// Contract suite finished
    ContractCheckComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaCompiled => "SCHEMA_COMPILED",
            Event::SchemaCompileFailed => "SCHEMA_COMPILE_FAILED",
            Event::CatalogBuilt => "FIELD_CATALOG_BUILT",
            Event::ProcessorRegistered => "PROCESSOR_REGISTERED",

            Event::PayloadAccepted => "PAYLOAD_ACCEPTED",
            Event::PayloadRejected => "PAYLOAD_REJECTED",

            Event::ContractCheckBegin => "CONTRACT_CHECK_BEGIN",
            Event::ContractCheckPassed => "CONTRACT_CHECK_PASSED",
            Event::ContractCheckFailed => "CONTRACT_CHECK_FAILED",
            Event::ContractCheckComplete => "CONTRACT_CHECK_COMPLETE",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::SchemaCompileFailed)
    }

    /// Default severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::SchemaCompileFailed => Severity::Fatal,
            Event::ContractCheckFailed => Severity::Error,
            Event::PayloadRejected => Severity::Warn,
            Event::PayloadAccepted => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
