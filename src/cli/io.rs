//! JSON I/O handling for CLI
//!
//! - Input: one request body, from a file or stdin
//! - Output: a single JSON object on stdout

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a request body from `file`, or from stdin when absent
pub fn read_body(file: Option<&Path>) -> CliResult<Vec<u8>> {
    let body = match file {
        Some(path) => fs::read(path)
            .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", path.display(), e)))?,
        None => {
            let mut body = Vec::new();
            io::stdin().lock().read_to_end(&mut body)?;
            body
        }
    };

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(CliError::io_error("Empty input"));
    }
    Ok(body)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(&response)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str, details: Value) -> CliResult<()> {
    let mut response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    if !details.is_null() {
        response["details"] = details;
    }
    write_line(&response)
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
