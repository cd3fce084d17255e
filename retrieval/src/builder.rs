//! Offline index construction.

use std::sync::Arc;

use chrono::Utc;
use confassist_embeddings::{EmbeddingProvider, EmbeddingRequest};
use tracing::{info, warn};

use crate::error::Result;
use crate::record::SessionRecord;
use crate::store::{IndexManifest, VectorStore};

/// Sessions embedded per provider request.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Embeds session descriptions into a new [`VectorStore`].
pub struct IndexBuilder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl IndexBuilder {
    /// Create a builder for the given provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set how many sessions are embedded per request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Embed every record and assemble the store.
    pub async fn build(&self, records: Vec<SessionRecord>) -> Result<VectorStore> {
        if records.is_empty() {
            warn!("Building an index with no sessions");
        }

        let manifest = IndexManifest {
            model: self.provider.default_model().to_string(),
            dimension: self.provider.default_dimension(),
            built_at: Utc::now(),
        };

        let mut entries = Vec::with_capacity(records.len());
        for batch in records.chunks(self.batch_size) {
            let requests = batch
                .iter()
                .map(|record| EmbeddingRequest::new(record.content.clone()))
                .collect();
            let responses = self.provider.embed_batch(requests).await?;
            for (record, response) in batch.iter().zip(responses) {
                entries.push((record.clone(), response.embedding));
            }
            info!(
                "Embedded {}/{} sessions with {}",
                entries.len(),
                records.len(),
                self.provider.name()
            );
        }

        VectorStore::build(manifest, entries)
    }
}
