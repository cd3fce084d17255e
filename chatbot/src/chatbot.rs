//! Flavor-driven assembly of the answer pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use confassist_embeddings::{EmbeddingProvider, HuggingFaceProvider, OpenAIProvider};
use confassist_retrieval::{
    IndexBuilder, IndexExpectation, Retriever, SessionRecord, VectorStore,
};
use tracing::info;

use crate::config::{ChatBotConfig, Credentials, Flavor};
use crate::error::Result;
use crate::llm::{HuggingFaceEndpoint, LanguageModel, OpenAIChatModel};
use crate::pipeline::{AnswerPipeline, Answerer};
use crate::prompt::{DEFAULT_TEMPLATE, PromptTemplate};

/// The embedding provider and language model for one flavor.
#[derive(Clone)]
pub struct Backends {
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub model: Arc<dyn LanguageModel>,
}

impl Backends {
    /// Build both backends for `config.flavor`.
    ///
    /// Fails when that flavor's credential is missing.
    pub fn for_flavor(config: &ChatBotConfig, credentials: &Credentials) -> Result<Self> {
        let api_key = credentials.require(config.flavor)?.to_string();

        let backends = match config.flavor {
            Flavor::OpenAI => {
                let settings = &config.openai;
                let mut embeddings = OpenAIProvider::new(Some(api_key.clone()))
                    .with_base_url(settings.base_url.clone())
                    .with_model(settings.embedding_model.clone());
                if let Some(dimension) = settings.embedding_dimension {
                    embeddings = embeddings.with_dimension(dimension);
                }
                let model = OpenAIChatModel::new(api_key)
                    .with_base_url(settings.base_url.clone())
                    .with_model(settings.chat_model.clone())
                    .with_temperature(settings.temperature);
                Self {
                    embeddings: Arc::new(embeddings),
                    model: Arc::new(model),
                }
            }
            Flavor::HuggingFace => {
                let settings = &config.huggingface;
                let mut embeddings = HuggingFaceProvider::new(Some(api_key.clone()))
                    .with_base_url(settings.base_url.clone())
                    .with_model(settings.embedding_model.clone());
                if let Some(dimension) = settings.embedding_dimension {
                    embeddings = embeddings.with_dimension(dimension);
                }
                let model = HuggingFaceEndpoint::new(api_key)
                    .with_base_url(settings.base_url.clone())
                    .with_repo_id(settings.repo_id.clone())
                    .with_temperature(settings.temperature)
                    .with_max_new_tokens(settings.max_new_tokens);
                Self {
                    embeddings: Arc::new(embeddings),
                    model: Arc::new(model),
                }
            }
        };

        Ok(backends)
    }

    /// What a loaded index must have been built with.
    pub fn expectation(&self) -> IndexExpectation {
        IndexExpectation::new(
            self.embeddings.default_model(),
            self.embeddings.default_dimension(),
        )
    }
}

/// The conference assistant for one flavor.
#[derive(Clone)]
pub struct ChatBot {
    flavor: Flavor,
    pipeline: AnswerPipeline,
}

impl ChatBot {
    /// Build the backends, load the flavor's index and assemble the pipeline.
    ///
    /// Any configuration or index error is returned; nothing is retried.
    pub async fn from_config(config: &ChatBotConfig, credentials: &Credentials) -> Result<Self> {
        let template = PromptTemplate::new(
            config
                .prompt_template
                .as_deref()
                .unwrap_or(DEFAULT_TEMPLATE),
        )?;
        let backends = Backends::for_flavor(config, credentials)?;

        let store = VectorStore::load_local(
            &config.index.data_dir,
            config.flavor.as_str(),
            &backends.expectation(),
            config.index.checksum_policy(),
        )
        .await?;

        info!(
            "Loaded {} sessions for the {} flavor ({}, {})",
            store.len(),
            config.flavor,
            backends.embeddings.default_model(),
            backends.model.model()
        );

        let retriever =
            Retriever::new(Arc::new(store), backends.embeddings).with_k(config.index.top_k);

        Ok(Self {
            flavor: config.flavor,
            pipeline: AnswerPipeline::new(retriever, template, backends.model),
        })
    }

    /// Active flavor.
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// The assembled pipeline.
    pub fn pipeline(&self) -> &AnswerPipeline {
        &self.pipeline
    }
}

#[async_trait]
impl Answerer for ChatBot {
    async fn answer(&self, question: &str) -> Result<String> {
        self.pipeline.answer(question).await
    }
}

/// Embed `records` with the flavor's provider and save the index.
///
/// Writes `<data_dir>/<flavor>.index.json` and its checksum sidecar.
pub async fn build_index(
    config: &ChatBotConfig,
    credentials: &Credentials,
    records: Vec<SessionRecord>,
) -> Result<VectorStore> {
    let backends = Backends::for_flavor(config, credentials)?;
    let store = IndexBuilder::new(backends.embeddings)
        .build(records)
        .await?;
    store
        .save_local(&config.index.data_dir, config.flavor.as_str())
        .await?;
    Ok(store)
}
