//! CLI module for faultgate
//!
//! Provides command-line interface for:
//! - validate: Validate and normalize one request body
//! - check: Run the offline contract checks
//! - routes: List the intake routes

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, process_body, routes, run, run_command, run_contract, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_body, write_error, write_response};
