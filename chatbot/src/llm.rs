//! Language model adapters.
//!
//! Both backends take a fully rendered prompt and return the model's text
//! unchanged. Failures are not retried.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ChatBotError, Result};

/// A text-completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name.
    fn name(&self) -> &str;

    /// Model identifier sent to the provider.
    fn model(&self) -> &str;

    /// Complete `prompt`, returning the generated text verbatim.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI chat-completions backend.
pub struct OpenAIChatModel {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a client for `gpt-3.5-turbo` at temperature 0.5.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.5,
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Requesting chat completion from {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let completion: ChatCompletionResponse =
            check_response("openai", response).await?.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ChatBotError::InvalidResponse("no completion choices".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Hugging Face hosted text-generation endpoint.
pub struct HuggingFaceEndpoint {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    repo_id: String,
    temperature: f32,
    max_new_tokens: u32,
}

impl HuggingFaceEndpoint {
    /// Create a client for `mistralai/Mistral-7B-Instruct-v0.2` at temperature 1.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            client: reqwest::Client::new(),
            repo_id: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            temperature: 1.0,
            max_new_tokens: 512,
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model repository.
    pub fn with_repo_id(mut self, repo_id: impl Into<String>) -> Self {
        self.repo_id = repo_id.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the generation length limit.
    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }
}

#[async_trait]
impl LanguageModel for HuggingFaceEndpoint {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn model(&self) -> &str {
        &self.repo_id
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Requesting text generation from {}", self.repo_id);

        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": {
                "temperature": self.temperature,
                "max_new_tokens": self.max_new_tokens,
                "return_full_text": false
            },
            "options": { "wait_for_model": true }
        });

        let response = self
            .client
            .post(format!("{}/models/{}", self.base_url, self.repo_id))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let generation: TextGeneration =
            check_response("huggingface", response).await?.json().await?;

        match generation {
            TextGeneration::Single(output) => Ok(output.generated_text),
            TextGeneration::List(outputs) => outputs
                .into_iter()
                .next()
                .map(|output| output.generated_text)
                .ok_or_else(|| ChatBotError::InvalidResponse("no generated text".to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextGeneration {
    List(Vec<GeneratedText>),
    Single(GeneratedText),
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Map rate limiting and non-success statuses to errors.
async fn check_response(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        return Err(ChatBotError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ChatBotError::ModelRequest {
            provider,
            message: format!("{status}: {error_text}"),
        });
    }

    Ok(response)
}
