//! BedrockService contract tests against a mocked invoke gateway.

use llm_service::config::llm_model_config::LlmModelConfig;
use llm_service::config::llm_provider::LlmProvider;
use llm_service::services::bedrock_service::BedrockService;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cfg(server: &MockServer, model: &str) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::Bedrock,
        model: model.to_string(),
        endpoint: server.uri(),
        api_key: Some("test-key".to_string()),
        max_tokens: Some(1000),
        temperature: Some(0.7),
        top_p: None,
        timeout_secs: Some(5),
    }
}

#[tokio::test]
async fn generate_posts_messages_body_and_reads_content_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/model/anthropic.claude-3-haiku-20240307-v1:0/invoke"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "anthropic_version": "bedrock-2023-05-31",
            "max_tokens": 1000,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [{"type": "text", "text": "the answer"}],
        })))
        .mount(&server)
        .await;

    let svc = BedrockService::new(cfg(&server, "anthropic.claude-3-haiku-20240307-v1:0"))
        .expect("service");
    let out = svc.generate("question", Some("system prompt")).await.unwrap();
    assert_eq!(out, "the answer");
}

#[tokio::test]
async fn embeddings_posts_input_text_and_reads_vector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/model/amazon.titan-embed-text-v1/invoke"))
        .and(body_partial_json(serde_json::json!({
            "inputText": "some chunk",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embedding": [0.1, 0.2, 0.3],
        })))
        .mount(&server)
        .await;

    let svc = BedrockService::new(cfg(&server, "amazon.titan-embed-text-v1")).expect("service");
    let out = svc.embeddings("some chunk").await.unwrap();
    assert_eq!(out, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn non_success_status_surfaces_snippet() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("throttled"))
        .mount(&server)
        .await;

    let svc = BedrockService::new(cfg(&server, "amazon.titan-embed-text-v1")).expect("service");
    let err = svc.embeddings("x").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("429"), "message was: {msg}");
    assert!(msg.contains("throttled"), "message was: {msg}");
}
