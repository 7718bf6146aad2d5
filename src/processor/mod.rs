//! Intake processors
//!
//! A processor owns one compiled schema, one presence rule table and one
//! transform. Processors are built once at startup, placed in a
//! [`ProcessorTable`] and shared across request threads.

pub mod error_event;
mod errors;
mod record;
mod schema_processor;
mod table;

pub use errors::{ProcessError, ProcessResult, SetupError};
pub use record::{timestamp_from_micros, EnvelopeTransform, NormalizedRecord, Transform};
pub use schema_processor::{Processor, SchemaProcessor};
pub use table::ProcessorTable;
