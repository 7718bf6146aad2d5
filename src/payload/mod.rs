//! Payload decoding, flattening and editing
//!
//! Raw bytes become `serde_json::Value` events here. Decoding failures are
//! per-request rejections; nothing downstream sees a partial batch.

mod document;
mod edit;
mod errors;
mod flatten;

pub use document::{parse_document, parse_ndjson, read_samples};
pub use edit::{remove_path, set_path};
pub use errors::{PayloadError, PayloadResult};
pub use flatten::{flatten_all, flatten_keys};
