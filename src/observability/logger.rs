//! Structured JSON logger
//!
//! One line per event: `event`, then `severity`, then the caller's fields
//! sorted by key. Writes are synchronous and unbuffered. Errors and fatal
//! events go to stderr, everything else to stdout.

use std::fmt;
use std::io::{self, Write};

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-payload detail
    Trace = 0,
    /// Lifecycle
    Info = 1,
    /// A rejected payload
    Warn = 2,
    /// A failed contract check
    Error = 3,
    /// The process cannot start
    Fatal = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn to_stderr(self) -> bool {
        self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless JSON line logger
pub struct Logger;

impl Logger {
    /// Log a typed event at its default severity
    pub fn event(event: Event, fields: &[(&str, &str)]) {
        let severity = event.severity();
        let line = render(severity, event.as_str(), fields);
        if severity.to_stderr() {
            write_line(&mut io::stderr().lock(), &line);
        } else {
            write_line(&mut io::stdout().lock(), &line);
        }
    }
}

fn write_line<W: Write>(writer: &mut W, line: &str) {
    // logging never fails the caller
    let _ = writer.write_all(line.as_bytes());
    let _ = writer.flush();
}

fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
    sorted.sort_by_key(|(key, _)| *key);

    let mut line = String::with_capacity(128);
    line.push_str("{\"event\":");
    push_quoted(&mut line, event);
    line.push_str(",\"severity\":");
    push_quoted(&mut line, severity.as_str());
    for (key, value) in sorted {
        line.push(',');
        push_quoted(&mut line, key);
        line.push(':');
        push_quoted(&mut line, value);
    }
    line.push_str("}\n");
    line
}

fn push_quoted(line: &mut String, text: &str) {
    match serde_json::to_string(text) {
        Ok(quoted) => line.push_str(&quoted),
        Err(_) => line.push_str("\"\""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(line: &str) -> Value {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_severity_routes_to_stderr() {
        assert!(!Severity::Warn.to_stderr());
        assert!(Severity::Error.to_stderr());
        assert!(Severity::Fatal.to_stderr());
    }

    #[test]
    fn test_render_is_one_json_line() {
        let line = render(Severity::Warn, "PAYLOAD_REJECTED", &[("route", "/v1/errors")]);
        assert!(line.ends_with("}\n"));
        let parsed = parse(&line);
        assert_eq!(parsed["event"], "PAYLOAD_REJECTED");
        assert_eq!(parsed["severity"], "WARN");
        assert_eq!(parsed["route"], "/v1/errors");
    }

    #[test]
    fn test_fields_sorted_regardless_of_input_order() {
        let a = render(Severity::Info, "CATALOG_BUILT", &[("schema", "error"), ("entries", "40")]);
        let b = render(Severity::Info, "CATALOG_BUILT", &[("entries", "40"), ("schema", "error")]);
        assert_eq!(a, b);
        assert!(a.starts_with("{\"event\":\"CATALOG_BUILT\",\"severity\":\"INFO\",\"entries\""));
    }

    #[test]
    fn test_violation_text_is_escaped() {
        let reason = "'error.context.tags.what\"ever': property is not allowed\n";
        let line = render(Severity::Warn, "PAYLOAD_REJECTED", &[("reason", reason)]);
        assert_eq!(parse(&line)["reason"], reason);
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_event_does_not_panic() {
        Logger::event(Event::ContractCheckBegin, &[("contract", "error")]);
    }
}
