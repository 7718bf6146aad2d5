//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::contract::ContractError;
use crate::processor::{ProcessError, SetupError};

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Contract file error
    ConfigError,
    /// I/O error (stdin/stdout/files)
    IoError,
    /// Processor table could not be built
    SetupFailed,
    /// Request body rejected
    Rejected,
    /// Contract checks found mismatches
    ContractFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "GATE_CLI_CONFIG_ERROR",
            Self::IoError => "GATE_CLI_IO_ERROR",
            Self::SetupFailed => "GATE_CLI_SETUP_FAILED",
            Self::Rejected => "GATE_CLI_REJECTED",
            Self::ContractFailed => "GATE_CLI_CONTRACT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn setup_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::SetupFailed, msg)
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::Rejected, msg)
    }

    pub fn contract_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ContractFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<SetupError> for CliError {
    fn from(e: SetupError) -> Self {
        Self::setup_failed(e.to_string())
    }
}

impl From<ProcessError> for CliError {
    fn from(e: ProcessError) -> Self {
        Self::rejected(e.to_string())
    }
}

impl From<ContractError> for CliError {
    fn from(e: ContractError) -> Self {
        match e {
            ContractError::Config { .. } => Self::config_error(e.to_string()),
            ContractError::Failed(_) => Self::contract_failed(e.to_string()),
            other => Self::setup_failed(other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
