//! Field paths, named sets and the field catalog
//!
//! The catalog is the list of dotted paths the indexing backend is willing
//! to expose. Named sets express allow lists over those paths, with groups
//! standing for whole subtrees.

mod catalog;
mod errors;
mod path;
mod set;

pub use catalog::{FieldCatalog, FieldCatalogEntry, FieldKind, FieldTemplate};
pub use errors::{FieldError, FieldResult};
pub use path::FieldPath;
pub(crate) use path::within_prefix;
pub use set::{Member, NamedSet, NamedSetBuilder};
