//! Question → answer pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use confassist_retrieval::Retriever;
use tracing::debug;

use crate::error::Result;
use crate::llm::LanguageModel;
use crate::prompt::{PromptTemplate, format_context};

/// Anything that can answer a user question.
#[async_trait]
pub trait Answerer: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String>;
}

/// Embed, retrieve, render, complete.
///
/// Holds only read-only shared state; concurrent calls do not interact.
#[derive(Clone)]
pub struct AnswerPipeline {
    retriever: Retriever,
    template: PromptTemplate,
    model: Arc<dyn LanguageModel>,
}

impl AnswerPipeline {
    pub fn new(
        retriever: Retriever,
        template: PromptTemplate,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            retriever,
            template,
            model,
        }
    }

    /// The retriever feeding the prompt.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// The language model producing answers.
    pub fn model(&self) -> &dyn LanguageModel {
        self.model.as_ref()
    }

    /// Retrieve context for `question` and render the full prompt.
    pub async fn prompt_for(&self, question: &str) -> Result<String> {
        let records = self.retriever.retrieve(question).await?;
        debug!(
            "Retrieved {} sessions (k = {})",
            records.len(),
            self.retriever.k()
        );

        let context = format_context(&records);
        let prompt = self.template.render(&context, question);
        debug!("Rendered prompt of {} bytes", prompt.len());
        Ok(prompt)
    }
}

#[async_trait]
impl Answerer for AnswerPipeline {
    async fn answer(&self, question: &str) -> Result<String> {
        let prompt = self.prompt_for(question).await?;
        let answer = self.model.complete(&prompt).await?;
        debug!(
            "{} ({}) answered with {} bytes",
            self.model.name(),
            self.model.model(),
            answer.len()
        );
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use confassist_embeddings::{
        EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, Result as EmbeddingResult,
    };
    use confassist_retrieval::{IndexManifest, SessionRecord, VectorStore};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Maps "testing" questions onto the first axis, everything else onto the second.
    struct AxisProvider;

    #[async_trait]
    impl EmbeddingProvider for AxisProvider {
        fn name(&self) -> &str {
            "axis"
        }

        fn default_model(&self) -> &str {
            "axis-2"
        }

        fn default_dimension(&self) -> usize {
            2
        }

        async fn embed(&self, request: EmbeddingRequest) -> EmbeddingResult<EmbeddingResponse> {
            let embedding = if request.text.contains("testing") {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
            };
            Ok(EmbeddingResponse {
                embedding,
                model: "axis-2".to_string(),
                dimension: 2,
                tokens_used: None,
            })
        }
    }

    /// Records every prompt and answers with a fixed string.
    #[derive(Default)]
    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        fn name(&self) -> &str {
            "recording"
        }

        fn model(&self) -> &str {
            "recording-1"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            Ok("**Testing Rust** is in Salon A.".to_string())
        }
    }

    fn pipeline(model: Arc<RecordingModel>) -> AnswerPipeline {
        let manifest = IndexManifest {
            model: "axis-2".to_string(),
            dimension: 2,
            built_at: Utc::now(),
        };
        let store = VectorStore::build(
            manifest,
            vec![
                (
                    SessionRecord::new("1", "Cloud Native Design").with_metadata("room", "B"),
                    vec![0.0, 1.0],
                ),
                (
                    SessionRecord::new("2", "Testing Rust").with_metadata("room", "Salon A"),
                    vec![1.0, 0.0],
                ),
            ],
        )
        .unwrap();
        let retriever = Retriever::new(Arc::new(store), Arc::new(AxisProvider)).with_k(1);
        let template = PromptTemplate::new("CTX[{context}] Q[{question}]").unwrap();
        AnswerPipeline::new(retriever, template, model)
    }

    #[tokio::test]
    async fn test_answer_renders_retrieved_context() {
        let model = Arc::new(RecordingModel::default());
        let pipeline = pipeline(model.clone());

        let answer = pipeline
            .answer("What sessions are about testing?")
            .await
            .unwrap();
        assert_eq!(answer, "**Testing Rust** is in Salon A.");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(
            *prompts,
            vec!["CTX[Testing Rust\nroom: Salon A] Q[What sessions are about testing?]".to_string()]
        );
    }

    #[tokio::test]
    async fn test_prompt_for_other_topic() {
        let pipeline = pipeline(Arc::new(RecordingModel::default()));
        let prompt = pipeline.prompt_for("Anything on the cloud?").await.unwrap();
        assert_eq!(prompt, "CTX[Cloud Native Design\nroom: B] Q[Anything on the cloud?]");
    }
}
