//! On-disk session vector store.
//!
//! An index is a JSON document `<namespace>.index.json` next to a
//! `<namespace>.index.sha256` sidecar in `sha256sum` format. The store is
//! read-only once loaded: it can be searched and saved, never mutated.

use std::path::Path;

use chrono::{DateTime, Utc};
use confassist_embeddings::{Embedding, SimilarityIndex};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::{ChecksumPolicy, IndexExpectation, checksum_path, index_path};
use crate::error::{Result, RetrievalError};
use crate::record::{ScoredRecord, SessionRecord};

/// Version written by [`VectorStore::save_local`].
pub const FORMAT_VERSION: u32 = 1;

/// Provenance of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Embedding model that produced the vectors.
    pub model: String,

    /// Dimension of every vector.
    pub dimension: usize,

    /// When the index was built.
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredIndex {
    format_version: u32,
    #[serde(flatten)]
    manifest: IndexManifest,
    entries: Vec<StoredEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    #[serde(flatten)]
    record: SessionRecord,
    embedding: Embedding,
}

/// Read-only nearest-neighbour store over session embeddings.
#[derive(Debug)]
pub struct VectorStore {
    manifest: IndexManifest,
    records: Vec<SessionRecord>,
    index: SimilarityIndex,
}

impl VectorStore {
    /// Assemble a store from records and their embeddings.
    pub fn build(
        manifest: IndexManifest,
        entries: Vec<(SessionRecord, Embedding)>,
    ) -> Result<Self> {
        let mut index = SimilarityIndex::new(manifest.dimension);
        let mut records = Vec::with_capacity(entries.len());
        for (record, embedding) in entries {
            index.add(record.id.clone(), embedding)?;
            records.push(record);
        }

        Ok(Self {
            manifest,
            records,
            index,
        })
    }

    /// Load `<dir>/<namespace>.index.json`.
    ///
    /// The file's digest is checked against the sidecar before parsing, and
    /// the stored model and dimension must match `expected`.
    pub async fn load_local(
        dir: impl AsRef<Path>,
        namespace: &str,
        expected: &IndexExpectation,
        checksum: ChecksumPolicy,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let path = index_path(dir, namespace);
        if !fs::try_exists(&path).await? {
            return Err(RetrievalError::IndexNotFound(path));
        }

        let raw = fs::read(&path).await?;
        verify_checksum(dir, namespace, &raw, checksum).await?;

        let stored: StoredIndex = serde_json::from_slice(&raw)?;
        if stored.format_version != FORMAT_VERSION {
            return Err(RetrievalError::UnsupportedFormat(stored.format_version));
        }

        let manifest = stored.manifest;
        if manifest.dimension != expected.dimension {
            return Err(RetrievalError::DimensionMismatch {
                path,
                expected: expected.dimension,
                actual: manifest.dimension,
            });
        }
        if manifest.model != expected.model {
            return Err(RetrievalError::ModelMismatch {
                path,
                expected: expected.model.clone(),
                actual: manifest.model,
            });
        }

        let store = Self::build(
            manifest,
            stored
                .entries
                .into_iter()
                .map(|entry| (entry.record, entry.embedding))
                .collect(),
        )?;

        info!(
            "Loaded index {} ({} sessions, model {}, dimension {})",
            path.display(),
            store.len(),
            store.manifest.model,
            store.manifest.dimension
        );
        Ok(store)
    }

    /// Write `<dir>/<namespace>.index.json` and its checksum sidecar.
    pub async fn save_local(&self, dir: impl AsRef<Path>, namespace: &str) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;

        let stored = StoredIndex {
            format_version: FORMAT_VERSION,
            manifest: self.manifest.clone(),
            entries: self
                .records
                .iter()
                .zip(self.index.iter())
                .map(|(record, entry)| StoredEntry {
                    record: record.clone(),
                    embedding: entry.embedding.clone(),
                })
                .collect(),
        };
        let raw = serde_json::to_vec(&stored)?;

        let path = index_path(dir, namespace);
        let sidecar = checksum_path(dir, namespace);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let digest = sha256_hex(&raw);

        // Both files are fully written before either is replaced, so the
        // swap is two back-to-back renames.
        let temp_index = path.with_extension("json.tmp");
        let temp_sidecar = sidecar.with_extension("sha256.tmp");
        fs::write(&temp_index, &raw).await?;
        fs::write(&temp_sidecar, format!("{digest}  {file_name}\n")).await?;
        fs::rename(&temp_index, &path).await?;
        fs::rename(&temp_sidecar, &sidecar).await?;

        info!("Saved {} sessions to {}", self.len(), path.display());
        Ok(())
    }

    /// Return up to `k` records most similar to `query`, best first.
    pub fn retrieve(&self, query: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        let results = self.index.search(query, k, f32::NEG_INFINITY)?;
        debug!("Index search returned {} of k={k}", results.len());

        Ok(results
            .into_iter()
            .map(|result| ScoredRecord {
                record: self.records[result.position].clone(),
                score: result.score,
            })
            .collect())
    }

    /// Provenance of this index.
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// All records, in index order.
    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    /// Number of sessions in the index.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

async fn verify_checksum(
    dir: &Path,
    namespace: &str,
    raw: &[u8],
    policy: ChecksumPolicy,
) -> Result<()> {
    let sidecar = checksum_path(dir, namespace);
    if !fs::try_exists(&sidecar).await? {
        return match policy {
            ChecksumPolicy::Require => Err(RetrievalError::ChecksumMissing(sidecar)),
            ChecksumPolicy::IfPresent => {
                warn!(
                    "No checksum for index {namespace} in {}; loading unverified",
                    dir.display()
                );
                Ok(())
            }
        };
    }

    let contents = fs::read_to_string(&sidecar).await?;
    let expected = contents
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let actual = sha256_hex(raw);

    if expected != actual {
        return Err(RetrievalError::ChecksumMismatch {
            path: index_path(dir, namespace),
            expected,
            actual,
        });
    }

    debug!("Checksum verified for index {namespace}");
    Ok(())
}

fn sha256_hex(raw: &[u8]) -> String {
    format!("{:x}", Sha256::digest(raw))
}
