//! Flavor → index → answer, against mocked Hugging Face and OpenAI endpoints.

use confassist_chatbot::{
    Answerer, ChatBot, ChatBotConfig, ChatBotError, Credentials, Flavor, build_index,
};
use confassist_retrieval::{IndexConfig, RetrievalError, SessionRecord};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUESTION: &str = "What sessions are about testing?";
const EMBED_PATH: &str = "/pipeline/feature-extraction/sentence-transformers/all-mpnet-base-v2";
const GENERATE_PATH: &str = "/models/mistralai/Mistral-7B-Instruct-v0.2";

fn credentials() -> Credentials {
    Credentials {
        openai_api_key: Some("sk-test".to_string()),
        huggingface_api_key: Some("hf-test".to_string()),
    }
}

fn huggingface_config(server: &MockServer, dir: &TempDir) -> ChatBotConfig {
    let mut config = ChatBotConfig::new(Flavor::HuggingFace)
        .with_index(IndexConfig::new(dir.path()).with_top_k(1));
    config.huggingface.base_url = server.uri();
    config.huggingface.embedding_dimension = Some(3);
    config
}

fn sessions() -> Vec<SessionRecord> {
    vec![
        SessionRecord::new("cloud", "Designing for the cloud").with_metadata("room", "Salon B"),
        SessionRecord::new("testing", "Property testing in practice")
            .with_metadata("room", "Salon A")
            .with_metadata("time", "10:30 AM"),
    ]
}

async fn mount_index_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(EMBED_PATH))
        .and(body_partial_json(serde_json::json!({
            "inputs": ["Designing for the cloud", "Property testing in practice"]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]])),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_question_is_answered_from_retrieved_sessions() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = huggingface_config(&server, &dir);

    mount_index_embeddings(&server).await;
    let store = build_index(&config, &credentials(), sessions())
        .await
        .unwrap();
    assert_eq!(store.len(), 2);
    assert!(dir.path().join("huggingface.index.json").exists());
    assert!(dir.path().join("huggingface.index.sha256").exists());

    Mock::given(method("POST"))
        .and(path(EMBED_PATH))
        .and(body_partial_json(serde_json::json!({ "inputs": QUESTION })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([0.9, 0.1, 0.0])))
        .expect(1)
        .mount(&server)
        .await;

    let answer = "You might enjoy **Property testing in practice** in Salon A at 10:30 AM.\n";
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("Property testing in practice"))
        .and(body_string_contains("room: Salon A"))
        .and(body_string_contains(format!("Question: {QUESTION}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "generated_text": answer }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let bot = ChatBot::from_config(&config, &credentials()).await.unwrap();
    assert_eq!(bot.flavor(), Flavor::HuggingFace);
    assert_eq!(bot.pipeline().retriever().k(), 1);

    // The model's text comes back untouched.
    assert_eq!(bot.answer(QUESTION).await.unwrap(), answer);
}

#[tokio::test]
async fn test_top_k_limits_context() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = huggingface_config(&server, &dir);

    mount_index_embeddings(&server).await;
    build_index(&config, &credentials(), sessions())
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path(EMBED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([0.9, 0.1, 0.0])))
        .mount(&server)
        .await;

    let bot = ChatBot::from_config(&config, &credentials()).await.unwrap();
    let prompt = bot.pipeline().prompt_for(QUESTION).await.unwrap();

    assert!(prompt.contains("Property testing in practice"));
    assert!(!prompt.contains("Designing for the cloud"));
}

#[tokio::test]
async fn test_model_failure_propagates() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = huggingface_config(&server, &dir);

    mount_index_embeddings(&server).await;
    build_index(&config, &credentials(), sessions())
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path(EMBED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([0.9, 0.1, 0.0])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("Model is loading"))
        .mount(&server)
        .await;

    let bot = ChatBot::from_config(&config, &credentials()).await.unwrap();
    assert!(matches!(
        bot.answer(QUESTION).await,
        Err(ChatBotError::ModelRequest {
            provider: "huggingface",
            ..
        })
    ));
}

#[tokio::test]
async fn test_switching_flavor_without_rebuilding_fails() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = huggingface_config(&server, &dir);

    mount_index_embeddings(&server).await;
    build_index(&config, &credentials(), sessions())
        .await
        .unwrap();

    // Reuse the Hugging Face vectors under the OpenAI namespace.
    std::fs::copy(
        dir.path().join("huggingface.index.json"),
        dir.path().join("openai.index.json"),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("openai.index.sha256"),
        std::fs::read_to_string(dir.path().join("huggingface.index.sha256"))
            .unwrap()
            .replace("huggingface.index.json", "openai.index.json"),
    )
    .unwrap();

    let mut switched = config.clone();
    switched.flavor = Flavor::OpenAI;
    let result = ChatBot::from_config(&switched, &credentials()).await;

    assert!(matches!(
        result,
        Err(ChatBotError::Retrieval(RetrievalError::DimensionMismatch {
            expected: 1536,
            actual: 3,
            ..
        }))
    ));
}

#[tokio::test]
async fn test_missing_index_halts_startup() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = huggingface_config(&server, &dir);

    let result = ChatBot::from_config(&config, &credentials()).await;
    assert!(matches!(
        result,
        Err(ChatBotError::Retrieval(RetrievalError::IndexNotFound(_)))
    ));
}

#[tokio::test]
async fn test_missing_credential_halts_startup() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = huggingface_config(&server, &dir);

    let result = ChatBot::from_config(&config, &Credentials::default()).await;
    assert!(matches!(
        result,
        Err(ChatBotError::MissingCredential {
            flavor: Flavor::HuggingFace,
            ..
        })
    ));
}
