//! Embedding providers.
//!
//! Two interchangeable backends are supported: the hosted OpenAI embeddings
//! API and the Hugging Face inference API (sentence-transformers models).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable holding the Hugging Face inference token.
pub const HUGGINGFACE_API_KEY_ENV: &str = "HUGGINGFACE_API_KEY";

/// Request for generating embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Model to use (provider-specific).
    pub model: Option<String>,

    /// Dimensions for the output (if supported by provider).
    pub dimensions: Option<usize>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            dimensions: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the output dimensions.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,

    /// Token usage (if available).
    pub tokens_used: Option<u64>,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the default embedding dimension.
    fn default_dimension(&self) -> usize;

    /// Generate an embedding for the given text.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, requests: Vec<EmbeddingRequest>) -> Result<Vec<EmbeddingResponse>> {
        // Default implementation: process sequentially
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.embed(request).await?);
        }
        Ok(results)
    }
}

/// OpenAI embedding provider.
pub struct OpenAIProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model.
    default_model: String,

    /// Dimension override for models missing from the built-in table.
    dimension: Option<usize>,
}

impl OpenAIProvider {
    /// Create a provider with an explicit (possibly absent) API key.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            default_model: "text-embedding-ada-002".to_string(),
            dimension: None,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Declare the output dimension of the default model.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(EmbeddingError::ProviderNotConfigured {
                provider: "openai",
                env_var: OPENAI_API_KEY_ENV,
            })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn default_dimension(&self) -> usize {
        if let Some(dimension) = self.dimension {
            return dimension;
        }
        match self.default_model.as_str() {
            "text-embedding-3-large" => 3072,
            "text-embedding-3-small" | "text-embedding-ada-002" => 1536,
            _ => 1536,
        }
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let api_key = self.api_key()?;

        let model = request.model.unwrap_or_else(|| self.default_model.clone());

        debug!("Generating embedding with model: {model}");

        let mut body = serde_json::json!({
            "input": request.text,
            "model": model
        });

        if let Some(dims) = request.dimensions {
            body["dimensions"] = serde_json::json!(dims);
        }

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let result: OpenAIEmbeddingResponse = check_response(response).await?.json().await?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))?
            .embedding;

        let expected = request.dimensions.unwrap_or_else(|| self.default_dimension());
        check_dimension(expected, &embedding)?;

        let dimension = embedding.len();
        let tokens_used = result.usage.map(|u| u.total_tokens);

        debug!("Generated embedding with {dimension} dimensions");

        Ok(EmbeddingResponse {
            embedding,
            model: result.model,
            dimension,
            tokens_used,
        })
    }

    async fn embed_batch(&self, requests: Vec<EmbeddingRequest>) -> Result<Vec<EmbeddingResponse>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let api_key = self.api_key()?;

        let model = requests[0]
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let texts: Vec<&str> = requests.iter().map(|r| r.text.as_str()).collect();

        debug!(
            "Generating batch embeddings for {} texts with model: {model}",
            texts.len()
        );

        let body = serde_json::json!({
            "input": texts,
            "model": model
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let mut result: OpenAIEmbeddingResponse = check_response(response).await?.json().await?;

        if result.data.len() != requests.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                requests.len(),
                result.data.len()
            )));
        }

        // The API may answer out of order; `index` is authoritative.
        result.data.sort_by_key(|item| item.index);

        let expected = self.default_dimension();
        let mut responses = Vec::with_capacity(result.data.len());
        for item in result.data {
            check_dimension(expected, &item.embedding)?;
            responses.push(EmbeddingResponse {
                dimension: item.embedding.len(),
                embedding: item.embedding,
                model: result.model.clone(),
                tokens_used: None,
            });
        }

        info!("Generated {} batch embeddings", responses.len());

        Ok(responses)
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
    model: String,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u64,
}

/// Hugging Face inference API embedding provider.
///
/// Uses the `feature-extraction` pipeline, which returns pooled sentence
/// embeddings for sentence-transformers models.
pub struct HuggingFaceProvider {
    /// Inference API token.
    api_key: Option<String>,

    /// Inference API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model repository id.
    default_model: String,

    /// Dimension override for models missing from the built-in table.
    dimension: Option<usize>,
}

impl HuggingFaceProvider {
    /// Create a provider with an explicit (possibly absent) token.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: "https://api-inference.huggingface.co".to_string(),
            client: reqwest::Client::new(),
            default_model: "sentence-transformers/all-mpnet-base-v2".to_string(),
            dimension: None,
        }
    }

    /// Set the API token.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Declare the output dimension of the default model.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(EmbeddingError::ProviderNotConfigured {
                provider: "huggingface",
                env_var: HUGGINGFACE_API_KEY_ENV,
            })
    }

    async fn feature_extraction(
        &self,
        model: &str,
        inputs: serde_json::Value,
    ) -> Result<FeatureExtraction> {
        let api_key = self.api_key()?;

        let body = serde_json::json!({
            "inputs": inputs,
            "options": { "wait_for_model": true }
        });

        let response = self
            .client
            .post(format!(
                "{}/pipeline/feature-extraction/{model}",
                self.base_url
            ))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        Ok(check_response(response).await?.json().await?)
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn default_dimension(&self) -> usize {
        if let Some(dimension) = self.dimension {
            return dimension;
        }
        match self.default_model.as_str() {
            "sentence-transformers/all-MiniLM-L6-v2" | "BAAI/bge-small-en-v1.5" => 384,
            "BAAI/bge-large-en-v1.5" => 1024,
            _ => 768,
        }
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let model = request.model.unwrap_or_else(|| self.default_model.clone());

        debug!("Generating embedding with model: {model}");

        let embedding = match self
            .feature_extraction(&model, serde_json::json!(request.text))
            .await?
        {
            FeatureExtraction::Pooled(embedding) => embedding,
            FeatureExtraction::Rows(mut rows) if rows.len() == 1 => rows.remove(0),
            FeatureExtraction::Rows(rows) => {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "expected a pooled embedding, got {} rows (token-level output?)",
                    rows.len()
                )));
            }
        };

        check_dimension(self.default_dimension(), &embedding)?;

        let dimension = embedding.len();
        debug!("Generated embedding with {dimension} dimensions");

        Ok(EmbeddingResponse {
            embedding,
            model,
            dimension,
            tokens_used: None,
        })
    }

    async fn embed_batch(&self, requests: Vec<EmbeddingRequest>) -> Result<Vec<EmbeddingResponse>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let model = requests[0]
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let texts: Vec<&str> = requests.iter().map(|r| r.text.as_str()).collect();

        debug!(
            "Generating batch embeddings for {} texts with model: {model}",
            texts.len()
        );

        let rows = match self
            .feature_extraction(&model, serde_json::json!(texts))
            .await?
        {
            FeatureExtraction::Rows(rows) => rows,
            FeatureExtraction::Pooled(embedding) => vec![embedding],
        };

        if rows.len() != requests.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                requests.len(),
                rows.len()
            )));
        }

        let expected = self.default_dimension();
        let mut responses = Vec::with_capacity(rows.len());
        for embedding in rows {
            check_dimension(expected, &embedding)?;
            responses.push(EmbeddingResponse {
                dimension: embedding.len(),
                embedding,
                model: model.clone(),
                tokens_used: None,
            });
        }

        info!("Generated {} batch embeddings", responses.len());

        Ok(responses)
    }
}

/// Feature-extraction output: one pooled vector, or one vector per input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureExtraction {
    Pooled(Vec<f32>),
    Rows(Vec<Vec<f32>>),
}

/// Map rate limiting and non-success statuses to errors.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        return Err(EmbeddingError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(EmbeddingError::ApiRequest(format!(
            "API error ({status}): {error_text}"
        )));
    }

    Ok(response)
}

fn check_dimension(expected: usize, embedding: &[f32]) -> Result<()> {
    if embedding.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(())
}
