//! Consistency check errors

use thiserror::Error;

use super::report::ConsistencyReport;

/// Raised at build or test time, never against live traffic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("Schema, field catalog and samples disagree: {0}")]
    Drift(ConsistencyReport),
}
