//! Error types for the embedding index.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for store and search operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No persisted store exists at the given path.
    #[error("no embedding store at {}", path.display())]
    NotFound { path: PathBuf },
    /// The persisted content is neither a flat map nor a list of records.
    #[error("unreadable embedding store: {0}")]
    Format(String),
    /// A vector does not match the store's fixed dimensionality.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// A vector was rejected during insert (empty, non-finite, zero-length).
    #[error("invalid vector for '{identifier}': {source}")]
    InvalidVector {
        identifier: String,
        source: core_types::EmbeddingError,
    },
    /// The query vector could not be normalized.
    #[error("invalid query vector: {0}")]
    InvalidQuery(core_types::EmbeddingError),
    /// Recommendation reference is not present in the store.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
