//! Error types for session retrieval.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur while loading, building, or querying the index.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] confassist_embeddings::EmbeddingError),

    /// No index file at the expected location.
    #[error("index not found: {}", .0.display())]
    IndexNotFound(PathBuf),

    /// The index was built with embeddings of another dimension.
    #[error(
        "index {} has dimension {actual}, but the embedding provider produces {expected}; rebuild the index for this flavor",
        .path.display()
    )]
    DimensionMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// The index was built with another embedding model.
    #[error(
        "index {} was built with model {actual}, but the embedding provider uses {expected}; rebuild the index for this flavor",
        .path.display()
    )]
    ModelMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The index file does not match its recorded digest.
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// A checksum is required but no sidecar file exists.
    #[error("checksum file missing: {}", .0.display())]
    ChecksumMissing(PathBuf),

    /// The index file uses an unknown format version.
    #[error("unsupported index format version {0}")]
    UnsupportedFormat(u32),

    /// Session input file could not be interpreted.
    #[error("invalid sessions file: {0}")]
    InvalidSessions(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
