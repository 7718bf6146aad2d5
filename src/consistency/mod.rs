//! Consistency between the wire schema, the field catalog and real samples
//!
//! Runs offline. A non-empty report means the three sources drifted apart
//! and the change must not ship.

mod checker;
mod errors;
mod report;

pub use checker::{check_consistency, ConsistencyExceptions};
pub use errors::ConsistencyError;
pub use report::ConsistencyReport;
