//! Similarity index for embedding lookups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::similarity::{SimilarityResult, find_top_k, normalize};

/// An entry in the similarity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Unique identifier.
    pub id: String,

    /// The embedding vector.
    pub embedding: Embedding,
}

/// A similarity index over embeddings of a fixed dimension.
///
/// Embeddings are stored unit-normalized. Entries keep their insertion order,
/// which is also the tie-break order for equal similarity scores. Search is an
/// exact cosine scan.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    /// Stored entries, in insertion order.
    entries: Vec<IndexEntry>,

    /// Position of each id in `entries`.
    positions: HashMap<String, usize>,

    /// Expected dimension of embeddings.
    dimension: usize,
}

impl SimilarityIndex {
    /// Create a new similarity index.
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            dimension,
        }
    }

    /// Add an embedding to the index.
    pub fn add(&mut self, id: impl Into<String>, mut embedding: Embedding) -> Result<()> {
        let id = id.into();

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        if self.positions.contains_key(&id) {
            return Err(EmbeddingError::DuplicateId(id));
        }

        normalize(&mut embedding);

        self.positions.insert(id.clone(), self.entries.len());
        debug!("Added embedding to index: {id}");
        self.entries.push(IndexEntry { id, embedding });

        Ok(())
    }

    /// Get the number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension every stored embedding has.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Iterate over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Search for similar embeddings.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        min_score: f32,
    ) -> Result<Vec<SimilarityResult>> {
        if query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut query = query.to_vec();
        normalize(&mut query);

        let candidates = self.entries.iter().map(|e| e.embedding.as_slice());
        let results = find_top_k(&query, candidates, k, min_score)?
            .into_iter()
            .map(|(position, score)| SimilarityResult {
                id: self.entries[position].id.clone(),
                position,
                score,
            })
            .collect();

        Ok(results)
    }
}
