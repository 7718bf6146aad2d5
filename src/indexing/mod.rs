//! Indexing constraint enforcement
//!
//! Keyword fields are indexed for exact matching up to a fixed length, and
//! dynamic map keys become field names in the backend. The schema has to
//! reject anything the backend cannot store.

mod constraint;
mod enforcer;
mod errors;

pub use constraint::{KeywordConstraint, DEFAULT_KEYWORD_LIMIT, DISALLOWED_KEY_CHARS};
pub use enforcer::{FieldMapping, IndexingMismatch, IndexingReport, KeywordEnforcer, MismatchKind};
pub use errors::IndexingError;
