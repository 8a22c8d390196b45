//! End-to-end reconciliation tests against a mocked query endpoint.

use std::time::Duration;

use query_client::{QueryClient, QueryClientConfig, QueryRequest, QuerySession};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn session_for(server: &MockServer) -> QuerySession {
    let cfg = QueryClientConfig {
        base_url: server.uri(),
        timeout: Some(Duration::from_secs(5)),
    };
    QuerySession::new(QueryClient::new(&cfg).expect("client"))
}

#[tokio::test]
async fn buffered_json_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "answer": "A",
            "sources": [],
            "query": "q",
            "timestamp": "t",
        })))
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let result = session.ask(QueryRequest::new("q")).await;

    assert_eq!(result.answer, "A");
    assert!(result.sources.is_empty());
    assert!(result.error.is_none());
    assert!(!result.is_loading);
}

#[tokio::test]
async fn non_success_status_records_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let result = session.ask(QueryRequest::new("q")).await;

    assert!(
        result
            .error
            .as_deref()
            .is_some_and(|e| e.contains("Internal Server Error")),
        "error was {:?}",
        result.error
    );
    assert_eq!(result.answer, "");
    assert!(!result.is_loading);
}

#[tokio::test]
async fn empty_success_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let result = session.ask(QueryRequest::new("q")).await;

    assert_eq!(result.error.as_deref(), Some("empty response body"));
    assert!(!result.is_loading);
}

#[tokio::test]
async fn plain_text_stream_becomes_the_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("Hello world".as_bytes(), "text/plain"),
        )
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let result = session.ask(QueryRequest::new("q")).await;

    assert_eq!(result.answer, "Hello world");
    assert!(result.error.is_none());
}

#[tokio::test]
async fn streamed_json_document_resolves_answer_and_sources() {
    let body = concat!(
        r#"{"answer":"final","sources":[{"title":"T","url":"u","source_type":"github","#,
        r#""relevance_score":0.5,"snippet":"s"}],"query":"q","timestamp":"t"}"#
    );
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.as_bytes(), "text/plain"))
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let result = session.ask(QueryRequest::new("q")).await;

    assert_eq!(result.answer, "final");
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].title, "T");
}

#[tokio::test]
async fn ndjson_events_accumulate_tokens_and_sources() {
    let body = concat!(
        "{\"type\":\"token\",\"content\":\"Hel\"}\n",
        "{\"type\":\"token\",\"content\":\"lo\"}\n",
        "{\"type\":\"sources\",\"sources\":[{\"title\":\"T\",\"url\":\"u\",",
        "\"source_type\":\"slack\",\"relevance_score\":0.9,\"snippet\":\"s\"}]}\n",
    );
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.as_bytes(), "application/x-ndjson"),
        )
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let result = session.ask(QueryRequest::new("q")).await;

    assert_eq!(result.answer, "Hello");
    assert_eq!(result.sources.len(), 1);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn blank_query_never_touches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let result = session.ask(QueryRequest::new("   \n\t ")).await;

    assert_eq!(result.answer, "");
    assert!(result.error.is_none());
    assert!(!result.is_loading);
}

#[test]
fn empty_base_url_is_rejected_at_construction() {
    let err = match QueryClient::new(&QueryClientConfig::default()) {
        Err(err) => err,
        Ok(_) => panic!("an empty base URL must not build a client"),
    };
    assert!(
        err.to_string().contains("VAULTIQ_API_URL"),
        "error was {err}"
    );
}

#[tokio::test]
async fn reset_is_idempotent() {
    let server = MockServer::start().await;
    let session = session_for(&server).await;

    session.reset();
    session.reset();

    let state = session.snapshot();
    assert_eq!(state.answer, "");
    assert!(state.sources.is_empty());
    assert!(state.error.is_none());
}

#[tokio::test]
async fn reset_during_a_query_still_clears_loading() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("late answer".as_bytes(), "text/plain")
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let in_flight = {
        let session = session.clone();
        tokio::spawn(async move { session.ask(QueryRequest::new("q")).await })
    };
    // Let the request reach the server, then discard it mid-flight.
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.reset();

    let _ = in_flight.await;
    let state = session.snapshot();
    // The discarded query's data writes stay discarded, but its loading
    // flag does not stay stuck on.
    assert!(!state.is_loading);
    assert_eq!(state.answer, "");
    assert!(state.error.is_none());
}

#[tokio::test]
async fn superseded_query_cannot_overwrite_the_newer_result() {
    let server = MockServer::start().await;
    // First call: slow plain-text body. Second call: fast JSON document.
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .and(body_partial_json(serde_json::json!({"query": "old"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("stale answer".as_bytes(), "text/plain")
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .and(body_partial_json(serde_json::json!({"query": "new"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "answer": "fresh",
            "sources": [],
            "query": "new",
            "timestamp": "t",
        })))
        .mount(&server)
        .await;

    let session = session_for(&server).await;
    let stale = {
        let session = session.clone();
        tokio::spawn(async move { session.ask(QueryRequest::new("old")).await })
    };
    // Let the first request reach the server before superseding it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let fresh = session.ask(QueryRequest::new("new")).await;
    assert_eq!(fresh.answer, "fresh");

    // Drain the stale reconciliation; it must not have touched the slot.
    let _ = stale.await;
    let state = session.snapshot();
    assert_eq!(state.answer, "fresh");
    assert!(state.error.is_none());
    assert!(!state.is_loading);
}
