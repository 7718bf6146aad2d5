//! Conditional field presence
//!
//! Two views of the same contract:
//! - `evaluator` checks live documents against a rule table
//! - `probe` checks a schema against the documented required keys

mod errors;
mod evaluator;
mod probe;
mod rules;

pub use errors::{PolicyError, PolicyResult};
pub use evaluator::{evaluate, evaluate_keys, PresencePolicy, RuleViolation};
pub use probe::{RequiredKeyProbe, Requirement, RequirednessMismatch, When, SENTINEL};
pub use rules::{Condition, PresenceRule};
