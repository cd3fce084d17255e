//! Configuration for the session index.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default directory holding the prebuilt index files.
pub const DEFAULT_DATA_DIR: &str = "./data/nebraska-code";

/// Default number of sessions retrieved per question.
pub const DEFAULT_TOP_K: usize = 10;

/// Where the index lives and how it is queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding `<namespace>.index.json` files.
    pub data_dir: PathBuf,

    /// Maximum number of sessions retrieved per question.
    pub top_k: usize,

    /// Refuse to load an index without a checksum sidecar.
    pub require_checksum: bool,
}

impl IndexConfig {
    /// Create a configuration for the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Set the number of sessions retrieved per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Checksum policy derived from `require_checksum`.
    pub fn checksum_policy(&self) -> ChecksumPolicy {
        if self.require_checksum {
            ChecksumPolicy::Require
        } else {
            ChecksumPolicy::IfPresent
        }
    }

    /// Path of the index file for a namespace.
    pub fn index_path(&self, namespace: &str) -> PathBuf {
        index_path(&self.data_dir, namespace)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            top_k: DEFAULT_TOP_K,
            require_checksum: true,
        }
    }
}

/// How to treat the checksum sidecar when loading an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// A sidecar must exist and match.
    Require,
    /// Verify the sidecar when it exists.
    IfPresent,
}

/// What the active embedding provider requires of a loaded index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexExpectation {
    /// Embedding model the index must have been built with.
    pub model: String,

    /// Embedding dimension the index must have.
    pub dimension: usize,
}

impl IndexExpectation {
    /// Create an expectation.
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
        }
    }
}

/// `<dir>/<namespace>.index.json`
pub fn index_path(dir: &Path, namespace: &str) -> PathBuf {
    dir.join(format!("{namespace}.index.json"))
}

/// `<dir>/<namespace>.index.sha256`
pub fn checksum_path(dir: &Path, namespace: &str) -> PathBuf {
    dir.join(format!("{namespace}.index.sha256"))
}
