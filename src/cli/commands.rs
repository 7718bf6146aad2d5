//! CLI command implementations
//!
//! Commands build what they need, run once and print a single JSON object.
//! The processor table is built before any input is read; a schema that
//! fails to compile stops the command before it touches the request.

use chrono::Utc;
use serde_json::{json, Value};
use std::path::Path;

use crate::contract::{ContractReport, ContractSuite};
use crate::processor::{ProcessError, Processor, ProcessorTable};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_body, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Validate { route, file } => validate(&route, file.as_deref()),
        Command::Check { config } => check(&config),
        Command::Routes => routes(),
    }
}

/// Validate one request body and print the normalized records
pub fn validate(route: &str, file: Option<&Path>) -> CliResult<()> {
    let table = ProcessorTable::standard()?;
    let body = read_body(file)?;

    match process_body(&table, route, &body) {
        Ok(data) => write_response(data),
        Err(err) => {
            let details = rejection_details(&err);
            let err = CliError::from(err);
            write_error(err.code_str(), err.message(), details)?;
            Err(err)
        }
    }
}

/// Run a contract and print its report
pub fn check(config_path: &Path) -> CliResult<()> {
    let report = run_contract(config_path)?;
    let data = serde_json::to_value(&report)?;

    match report.into_result() {
        Ok(_) => write_response(data),
        Err(err) => {
            let err = CliError::from(err);
            write_error(err.code_str(), err.message(), data)?;
            Err(err)
        }
    }
}

/// Print the registered intake routes
pub fn routes() -> CliResult<()> {
    let table = ProcessorTable::standard()?;
    let routes: Vec<Value> = table
        .routes()
        .filter_map(|route| {
            table
                .get(route)
                .map(|processor| json!({"route": route, "processor": processor.name()}))
        })
        .collect();
    write_response(Value::Array(routes))
}

/// Processes a body and renders the accepted records.
pub fn process_body(table: &ProcessorTable, route: &str, body: &[u8]) -> Result<Value, ProcessError> {
    let records = table.process(route, body, Utc::now())?;
    let records: Vec<Value> = records.iter().map(|record| record.to_value()).collect();
    Ok(json!({
        "route": route,
        "records": records
    }))
}

/// Loads and runs a contract without printing.
pub fn run_contract(config_path: &Path) -> CliResult<ContractReport> {
    let suite = ContractSuite::load(config_path)?;
    Ok(suite.run()?)
}

fn rejection_details(err: &ProcessError) -> Value {
    let details = match err {
        ProcessError::Validation { index, violations, .. } => {
            serde_json::to_value(violations).map(|v| json!({"event": index, "violations": v}))
        }
        ProcessError::Policy { index, violations, .. } => {
            serde_json::to_value(violations).map(|v| json!({"event": index, "violations": v}))
        }
        _ => return json!({"kind": err.kind()}),
    };
    details.unwrap_or(Value::Null)
}
