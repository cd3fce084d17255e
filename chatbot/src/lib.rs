//! # Conference Assistant Pipeline
//!
//! Turns a question into an answer about Nebraska.Code() sessions:
//!
//! 1. embed the question with the flavor's embedding provider
//! 2. retrieve the closest sessions from the prebuilt index
//! 3. render them and the question into the prompt template
//! 4. send the prompt to the flavor's language model
//!
//! ## Usage
//!
//! ```rust,ignore
//! use confassist_chatbot::{Answerer, ChatBot, ChatBotConfig, Credentials, Flavor};
//!
//! let config = ChatBotConfig::new(Flavor::OpenAI);
//! let bot = ChatBot::from_config(&config, &Credentials::from_env()).await?;
//! let answer = bot.answer("What sessions are about testing?").await?;
//! ```

pub mod chatbot;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompt;

pub use chatbot::{Backends, ChatBot, build_index};
pub use config::{ChatBotConfig, Credentials, Flavor, HuggingFaceConfig, OpenAIConfig};
pub use error::{ChatBotError, Result};
pub use llm::{HuggingFaceEndpoint, LanguageModel, OpenAIChatModel};
pub use pipeline::{AnswerPipeline, Answerer};
pub use prompt::{DEFAULT_TEMPLATE, PromptTemplate, format_context};
