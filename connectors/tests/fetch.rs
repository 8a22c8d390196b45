//! Connector contract tests against mocked upstream APIs.

use connectors::confluence::{ConfluenceConfig, ConfluenceConnector};
use connectors::github::{GitHubConfig, GitHubConnector};
use connectors::slack::{SlackConfig, SlackConnector};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn confluence_pages_are_searched_then_expanded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/content/search"))
        .and(query_param("cql", "type=page AND space=\"OPS\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{ "content": { "id": "123" } }],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/content/123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "123",
            "title": "Deploy Runbook",
            "body": { "storage": { "value": "step one" } },
            "space": { "name": "Ops", "key": "OPS" },
            "version": { "number": 4 },
            "_links": { "webui": "/pages/123" },
        })))
        .mount(&server)
        .await;

    let connector = ConfluenceConnector::new(ConfluenceConfig {
        base_url: server.uri(),
        username: "bot@example.com".to_string(),
        api_key: "token".to_string(),
        space_key: Some("OPS".to_string()),
    })
    .expect("connector");

    let docs = connector.fetch(10).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].origin_id, "123");
    assert_eq!(docs[0].title, "Deploy Runbook");
    assert_eq!(docs[0].text, "Title: Deploy Runbook\n\nstep one");
    assert_eq!(docs[0].url, format!("{}/pages/123", server.uri()));
}

#[tokio::test]
async fn failed_page_expansion_skips_only_that_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/api/content/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                { "content": { "id": "1" } },
                { "content": { "id": "2" } },
            ],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/content/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/api/content/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "2",
            "title": "Still Here",
            "body": { "storage": { "value": "content" } },
            "_links": { "webui": "/pages/2" },
        })))
        .mount(&server)
        .await;

    let connector = ConfluenceConnector::new(ConfluenceConfig {
        base_url: server.uri(),
        username: "bot@example.com".to_string(),
        api_key: "token".to_string(),
        space_key: None,
    })
    .expect("connector");

    let docs = connector.fetch(10).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].title, "Still Here");
}

#[tokio::test]
async fn slack_error_envelope_fails_the_sync() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": false,
            "error": "invalid_auth",
        })))
        .mount(&server)
        .await;

    let connector = SlackConnector::new(SlackConfig {
        bot_token: "xoxb-test".to_string(),
        channels: Vec::new(),
        days_back: 7,
        api_base: server.uri(),
    })
    .expect("connector");

    let err = connector.fetch(10).await.unwrap_err();
    assert!(err.to_string().contains("invalid_auth"));
}

#[tokio::test]
async fn slack_channels_become_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations.list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "channels": [{ "id": "C01", "name": "ops" }],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "messages": [
                { "ts": "1.0", "user": "U01", "text": "deploy done" },
                { "ts": "2.0", "text": "" },
            ],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users.info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "user": { "real_name": "Ada", "name": "ada" },
        })))
        .mount(&server)
        .await;

    let connector = SlackConnector::new(SlackConfig {
        bot_token: "xoxb-test".to_string(),
        channels: Vec::new(),
        days_back: 7,
        api_base: server.uri(),
    })
    .expect("connector");

    let docs = connector.fetch(10).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].title, "Slack Channel: ops");
    assert_eq!(docs[0].text, "User: Ada\ndeploy done");
}

#[tokio::test]
async fn github_issue_list_drops_pull_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "full_name": "acme/api", "html_url": "https://github.com/acme/api",
              "description": "backend", "language": "Rust", "default_branch": "main" },
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/api/readme"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# api"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/api/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "number": 1, "title": "real issue", "body": "details" },
            { "number": 2, "title": "a pr", "body": "diff", "pull_request": { "url": "x" } },
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/api/pulls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let connector = GitHubConnector::new(GitHubConfig {
        token: "ghp-test".to_string(),
        org: Some("acme".to_string()),
        api_base: server.uri(),
    })
    .expect("connector");

    let docs = connector.fetch(10).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert!(docs[0].text.contains("#1: real issue"));
    assert!(!docs[0].text.contains("#2: a pr"));
}
