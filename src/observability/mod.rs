//! Observability for faultgate
//!
//! Structured JSON logging with typed lifecycle events. Logging is
//! read-only: it never changes a validation result and runs on the
//! caller's thread.
//!
//! # Usage
//!
//! ```ignore
//! use faultgate::observability::{Event, Logger};
//!
//! Logger::event(Event::SchemaCompiled, &[("schema", "error")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
