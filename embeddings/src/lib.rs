//! # Embeddings
//!
//! Semantic embedding generation and similarity search for the conference
//! assistant.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert questions and session descriptions to dense vectors
//! - **Multiple Providers**: OpenAI embeddings API and the Hugging Face inference API
//! - **Similarity Search**: Exact cosine top-k search over an in-memory index
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► SimilarityIndex           │
//! │       │                                   │                     │
//! │       ▼                                   ▼                     │
//! │  OpenAI/HuggingFace                  find_top_k                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod index;
pub mod provider;
pub mod similarity;

pub use error::{EmbeddingError, Result};
pub use index::{IndexEntry, SimilarityIndex};
pub use provider::{
    EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, HuggingFaceProvider, OpenAIProvider,
};
pub use similarity::{SimilarityResult, cosine_similarity};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
