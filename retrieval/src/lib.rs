//! # Session Retrieval
//!
//! This crate owns the conference-session vector index:
//!
//! - **Records**: session descriptions plus room/time metadata
//! - **Store**: the read-only on-disk index, integrity-checked on load
//! - **Retriever**: question in, up to k most similar sessions out
//! - **Builder**: offline embedding of session records into a new index
//!
//! ## Usage
//!
//! ```rust,ignore
//! use confassist_retrieval::{IndexConfig, IndexExpectation, Retriever, VectorStore};
//!
//! let config = IndexConfig::default();
//! let expected = IndexExpectation::new(provider.default_model(), provider.default_dimension());
//! let store = VectorStore::load_local(&config.data_dir, "openai", &expected, config.checksum_policy()).await?;
//! let retriever = Retriever::new(Arc::new(store), provider).with_k(config.top_k);
//!
//! let sessions = retriever.retrieve("What sessions are about testing?").await?;
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod record;
pub mod retriever;
pub mod store;

pub use builder::IndexBuilder;
pub use config::{ChecksumPolicy, IndexConfig, IndexExpectation};
pub use error::{Result, RetrievalError};
pub use record::{ScoredRecord, SessionRecord, load_sessions};
pub use retriever::Retriever;
pub use store::{IndexManifest, VectorStore};

// Re-export from dependencies for convenience
pub use confassist_embeddings::EmbeddingProvider;
