//! faultgate - schema-enforced intake gateway for error events
//!
//! Request path: payload decoding, schema validation, presence rules and
//! record normalization. Offline: consistency between schema, field
//! catalog and samples, indexing limits and contract cases.

pub mod cli;
pub mod consistency;
pub mod contract;
pub mod fields;
pub mod indexing;
pub mod observability;
pub mod payload;
pub mod policy;
pub mod processor;
pub mod schema;
