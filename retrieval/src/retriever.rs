//! Question → session retrieval.

use std::sync::Arc;

use confassist_embeddings::{EmbeddingProvider, EmbeddingRequest};
use tracing::debug;

use crate::config::DEFAULT_TOP_K;
use crate::error::Result;
use crate::record::SessionRecord;
use crate::store::VectorStore;

/// Embeds a question and looks up the most similar sessions.
///
/// Holds only shared, read-only state, so one retriever can serve any number
/// of concurrent questions.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<VectorStore>,
    provider: Arc<dyn EmbeddingProvider>,
    k: usize,
}

impl Retriever {
    /// Create a retriever returning up to ten sessions.
    pub fn new(store: Arc<VectorStore>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store,
            provider,
            k: DEFAULT_TOP_K,
        }
    }

    /// Set the maximum number of sessions returned.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Maximum number of sessions returned.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Return up to `k` sessions related to `question`, most similar first.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SessionRecord>> {
        let query = self
            .provider
            .embed(EmbeddingRequest::new(question))
            .await?;
        debug!(
            "Embedded question with {} ({} dimensions)",
            query.model, query.dimension
        );

        let scored = self.store.retrieve(&query.embedding, self.k)?;
        Ok(scored.into_iter().map(|scored| scored.record).collect())
    }
}
