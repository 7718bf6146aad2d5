//! Offline contract checks
//!
//! A contract ties one event type's schema, rule table, field catalog and
//! sample data together. Running it proves the three independently
//! maintained artifacts still agree; it is meant for CI, not the request
//! path.
//!
//! # Usage
//!
//! ```ignore
//! use faultgate::contract::ContractSuite;
//!
//! let suite = ContractSuite::load(Path::new("contracts/error.json"))?;
//! suite.run()?.into_result()?;
//! ```

mod cases;
mod config;
mod errors;
mod suite;

pub use cases::{run_cases, CaseFailure, CaseOutcome, DataCase, InvalidValues};
pub use config::{ConsistencyConfig, ContractConfig, IndexingConfig, ProbeConfig};
pub use errors::{ContractError, ContractResult};
pub use suite::{ContractReport, ContractSuite};
