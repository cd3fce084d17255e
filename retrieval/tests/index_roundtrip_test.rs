//! Build → save → load → retrieve, end to end against a keyword embedder.

use std::sync::Arc;

use async_trait::async_trait;
use confassist_embeddings::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use confassist_retrieval::{
    ChecksumPolicy, IndexBuilder, IndexExpectation, RetrievalError, Retriever, SessionRecord,
    VectorStore,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const VOCABULARY: [&str; 4] = ["testing", "rust", "cloud", "design"];

/// Embeds text as keyword counts over a fixed vocabulary.
struct KeywordProvider {
    model: &'static str,
}

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn name(&self) -> &str {
        "keyword"
    }

    fn default_model(&self) -> &str {
        self.model
    }

    fn default_dimension(&self) -> usize {
        VOCABULARY.len()
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> confassist_embeddings::Result<EmbeddingResponse> {
        let text = request.text.to_lowercase();
        let embedding: Vec<f32> = VOCABULARY
            .iter()
            .map(|word| text.matches(word).count() as f32)
            .collect();
        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: self.model.to_string(),
            tokens_used: None,
        })
    }
}

fn sessions(count: usize) -> Vec<SessionRecord> {
    let topics = [
        "Testing strategies for legacy code",
        "Rust for web services",
        "Cloud cost design reviews",
        "Design systems at scale",
    ];
    (0..count)
        .map(|i| {
            SessionRecord::new(format!("s{i}"), topics[i % topics.len()])
                .with_metadata("room", format!("Room {}", i % 3))
                .with_metadata("time", format!("{}:00", 9 + i % 8))
        })
        .collect()
}

#[tokio::test]
async fn test_build_save_load_retrieve() {
    let dir = TempDir::new().unwrap();
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(KeywordProvider { model: "kw-1" });

    let store = IndexBuilder::new(Arc::clone(&provider))
        .with_batch_size(5)
        .build(sessions(24))
        .await
        .unwrap();
    store.save_local(dir.path(), "openai").await.unwrap();

    let loaded = VectorStore::load_local(
        dir.path(),
        "openai",
        &IndexExpectation::new("kw-1", VOCABULARY.len()),
        ChecksumPolicy::Require,
    )
    .await
    .unwrap();
    assert_eq!(loaded.len(), 24);

    let retriever = Retriever::new(Arc::new(loaded), provider);
    let results = retriever
        .retrieve("What sessions are about testing?")
        .await
        .unwrap();

    assert_eq!(results.len(), 10);
    assert_eq!(results[0].content, "Testing strategies for legacy code");
    // All six testing sessions outrank everything else, in index order.
    let ids: Vec<&str> = results.iter().take(6).map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["s0", "s4", "s8", "s12", "s16", "s20"]);
}

#[tokio::test]
async fn test_small_index_returns_fewer_than_k() {
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(KeywordProvider { model: "kw-1" });
    let store = IndexBuilder::new(Arc::clone(&provider))
        .build(sessions(3))
        .await
        .unwrap();

    let retriever = Retriever::new(Arc::new(store), provider).with_k(10);
    let results = retriever.retrieve("rust").await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].id, "s1");
}

#[tokio::test]
async fn test_switching_provider_requires_rebuild() {
    let dir = TempDir::new().unwrap();
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(KeywordProvider { model: "kw-1" });
    IndexBuilder::new(provider)
        .build(sessions(4))
        .await
        .unwrap()
        .save_local(dir.path(), "openai")
        .await
        .unwrap();

    // A provider with 768-dimensional output cannot use this index.
    let err = VectorStore::load_local(
        dir.path(),
        "openai",
        &IndexExpectation::new("sentence-transformers/all-mpnet-base-v2", 768),
        ChecksumPolicy::Require,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RetrievalError::DimensionMismatch { .. }));

    // And the other flavor's namespace has not been built at all.
    let err = VectorStore::load_local(
        dir.path(),
        "huggingface",
        &IndexExpectation::new("kw-1", VOCABULARY.len()),
        ChecksumPolicy::Require,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RetrievalError::IndexNotFound(_)));
}
