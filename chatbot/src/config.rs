//! Flavor selection and backend configuration.

use std::fmt;
use std::str::FromStr;

use confassist_embeddings::provider::{HUGGINGFACE_API_KEY_ENV, OPENAI_API_KEY_ENV};
use confassist_retrieval::IndexConfig;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ChatBotError, Result};

/// Which provider pair (embeddings + language model) is active.
///
/// Serialized as the lowercase name; parsing from config or the command line
/// ignores case and surrounding whitespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// OpenAI embeddings and chat completions.
    OpenAI,
    /// Hugging Face inference API for both.
    #[default]
    HuggingFace,
}

impl Flavor {
    /// Canonical lowercase name, also the index namespace.
    pub fn as_str(self) -> &'static str {
        match self {
            Flavor::OpenAI => "openai",
            Flavor::HuggingFace => "huggingface",
        }
    }

    /// Environment variable holding this flavor's credential.
    pub fn credential_env(self) -> &'static str {
        match self {
            Flavor::OpenAI => OPENAI_API_KEY_ENV,
            Flavor::HuggingFace => HUGGINGFACE_API_KEY_ENV,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flavor {
    type Err = ChatBotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Flavor::OpenAI),
            "huggingface" => Ok(Flavor::HuggingFace),
            _ => Err(ChatBotError::UnknownFlavor(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Flavor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Complete assistant configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatBotConfig {
    /// Active provider pair.
    pub flavor: Flavor,

    /// Index location and retrieval depth.
    pub index: IndexConfig,

    /// OpenAI backend settings.
    pub openai: OpenAIConfig,

    /// Hugging Face backend settings.
    pub huggingface: HuggingFaceConfig,

    /// Replacement prompt template; must contain `{context}` and `{question}`.
    pub prompt_template: Option<String>,
}

impl ChatBotConfig {
    /// Configuration with defaults for the given flavor.
    pub fn new(flavor: Flavor) -> Self {
        Self {
            flavor,
            ..Self::default()
        }
    }

    /// Set the index configuration.
    pub fn with_index(mut self, index: IndexConfig) -> Self {
        self.index = index;
        self
    }
}

/// OpenAI backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    pub base_url: String,
    pub chat_model: String,
    pub temperature: f32,
    pub embedding_model: String,
    /// Needed only for embedding models the provider does not know.
    pub embedding_dimension: Option<usize>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            temperature: 0.5,
            embedding_model: "text-embedding-ada-002".to_string(),
            embedding_dimension: None,
        }
    }
}

/// Hugging Face inference API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    pub base_url: String,
    pub repo_id: String,
    pub temperature: f32,
    pub max_new_tokens: u32,
    pub embedding_model: String,
    /// Needed only for embedding models the provider does not know.
    pub embedding_dimension: Option<usize>,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co".to_string(),
            repo_id: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            temperature: 1.0,
            max_new_tokens: 512,
            embedding_model: "sentence-transformers/all-mpnet-base-v2".to_string(),
            embedding_dimension: None,
        }
    }
}

/// API credentials, read once at startup.
#[derive(Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub huggingface_api_key: Option<String>,
}

impl Credentials {
    /// Read `OPENAI_API_KEY` and `HUGGINGFACE_API_KEY`.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: read(OPENAI_API_KEY_ENV),
            huggingface_api_key: read(HUGGINGFACE_API_KEY_ENV),
        }
    }

    /// The credential for `flavor`, or a configuration error.
    pub fn require(&self, flavor: Flavor) -> Result<&str> {
        let key = match flavor {
            Flavor::OpenAI => self.openai_api_key.as_deref(),
            Flavor::HuggingFace => self.huggingface_api_key.as_deref(),
        };
        key.ok_or(ChatBotError::MissingCredential {
            flavor,
            env_var: flavor.credential_env(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("huggingface_api_key", &mask(&self.huggingface_api_key))
            .finish()
    }
}
