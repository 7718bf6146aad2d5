//! Contract suite errors

use thiserror::Error;

use super::suite::ContractReport;
use crate::fields::FieldError;
use crate::payload::PayloadError;
use crate::policy::PolicyError;
use crate::processor::ProcessError;
use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Invalid contract config '{path}': {reason}")]
    Config { path: String, reason: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Field catalog error: {0}")]
    Fields(#[from] FieldError),

    #[error("Rule table error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Sample error: {0}")]
    Payload(#[from] PayloadError),

    /// The samples themselves do not pass the processor
    #[error("Sample batch rejected: {0}")]
    SampleRejected(#[from] ProcessError),

    #[error("Contract '{}' failed: {}", .0.name, .0)]
    Failed(Box<ContractReport>),
}

impl ContractError {
    pub(crate) fn config(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type ContractResult<T> = Result<T, ContractError>;
