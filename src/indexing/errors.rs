//! Indexing constraint errors

use thiserror::Error;

use super::enforcer::IndexingReport;

/// Raised at build or test time when schema limits and backend limits diverge
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexingError {
    #[error("Schema disagrees with indexing limits: {0}")]
    Diverged(IndexingReport),
}
