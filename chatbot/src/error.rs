//! Error types for the answer pipeline.

use thiserror::Error;

use crate::config::Flavor;

/// Result type alias for chatbot operations.
pub type Result<T> = std::result::Result<T, ChatBotError>;

/// Errors raised while configuring or running the assistant.
#[derive(Error, Debug)]
pub enum ChatBotError {
    /// Flavor string is neither `openai` nor `huggingface`.
    #[error("unknown flavor {0:?}: expected \"openai\" or \"huggingface\"")]
    UnknownFlavor(String),

    /// The active flavor's credential is not set.
    #[error("{flavor} flavor requires {env_var} to be set")]
    MissingCredential {
        flavor: Flavor,
        env_var: &'static str,
    },

    /// Prompt template lacks a required slot.
    #[error("invalid prompt template: {0}")]
    InvalidTemplate(String),

    /// Language model request failed.
    #[error("{provider} completion failed: {message}")]
    ModelRequest {
        provider: &'static str,
        message: String,
    },

    /// Language model rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Language model answered with an unexpected payload.
    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    /// Retrieval error (index load or query).
    #[error("retrieval error: {0}")]
    Retrieval(#[from] confassist_retrieval::RetrievalError),

    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] confassist_embeddings::EmbeddingError),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
