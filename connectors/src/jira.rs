//! Jira connector: JQL issue search with comments.

use std::env;

use query_client::SourceType;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::document::Document;
use crate::errors::connector_error::ConnectorError;
use crate::http::{expect_json, str_field};

const PAGE_SIZE: usize = 50;
const DEFAULT_JQL: &str = "updated >= -30d ORDER BY updated DESC";

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    /// Overrides the default "recently updated" query.
    pub jql: Option<String>,
}

impl JiraConfig {
    pub fn from_env() -> Result<Self, ConnectorError> {
        Ok(Self {
            base_url: must_env("JIRA_URL")?.trim_end_matches('/').to_string(),
            email: must_env("JIRA_EMAIL")?,
            api_token: must_env("JIRA_API_TOKEN")?,
            jql: env::var("JIRA_JQL").ok().filter(|v| !v.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JiraComment {
    pub author: String,
    pub body: String,
}

pub struct JiraConnector {
    client: reqwest::Client,
    config: JiraConfig,
}

impl JiraConnector {
    pub fn new(config: JiraConfig) -> Result<Self, ConnectorError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            config,
        })
    }

    pub fn from_env() -> Result<Self, ConnectorError> {
        Self::new(JiraConfig::from_env()?)
    }

    /// Fetches up to `limit` issues; issues whose comment fetch fails keep
    /// an empty comment list instead of failing the sync.
    pub async fn fetch(&self, limit: usize) -> Result<Vec<Document>, ConnectorError> {
        let jql = self.config.jql.as_deref().unwrap_or(DEFAULT_JQL);

        let mut documents = Vec::new();
        let mut start_at = 0usize;
        while documents.len() < limit {
            let batch_size = PAGE_SIZE.min(limit - documents.len());
            let url = format!("{}/rest/api/2/search", self.config.base_url);
            let resp = self
                .client
                .get(&url)
                .basic_auth(&self.config.email, Some(&self.config.api_token))
                .query(&[
                    ("jql", jql),
                    ("startAt", &start_at.to_string()),
                    ("maxResults", &batch_size.to_string()),
                    (
                        "fields",
                        "summary,description,status,issuetype,project,updated",
                    ),
                ])
                .send()
                .await?;
            let doc = expect_json(resp, "jira").await?;

            let issues = doc
                .get("issues")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if issues.is_empty() {
                break;
            }
            let batch_len = issues.len();

            for issue in &issues {
                documents.push(self.build_document(issue).await);
            }

            start_at += batch_len;
            if batch_len < batch_size {
                break;
            }
        }

        info!(target: "connectors", issues = documents.len(), "fetched jira issues");
        Ok(documents)
    }

    /* --- Internals --- */

    async fn build_document(&self, issue: &Value) -> Document {
        let key = str_field(issue, "key");
        let fields = issue.get("fields").cloned().unwrap_or(Value::Null);
        let summary = str_field(&fields, "summary");
        let description = str_field(&fields, "description");

        let comments = match self.fetch_comments(&key).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(target: "connectors", issue = %key, error = %e, "comments unavailable");
                Vec::new()
            }
        };

        Document {
            origin_id: key.clone(),
            source: SourceType::Jira,
            title: format!("{key}: {summary}"),
            url: format!("{}/browse/{key}", self.config.base_url),
            text: render_issue(&key, &summary, &description, &comments),
            metadata: json!({
                "status": fields.pointer("/status/name").and_then(Value::as_str).unwrap_or_default(),
                "issue_type": fields.pointer("/issuetype/name").and_then(Value::as_str).unwrap_or_default(),
                "project": fields.pointer("/project/key").and_then(Value::as_str).unwrap_or_default(),
            }),
        }
    }

    async fn fetch_comments(&self, issue_key: &str) -> Result<Vec<JiraComment>, ConnectorError> {
        let url = format!(
            "{}/rest/api/2/issue/{issue_key}/comment",
            self.config.base_url
        );
        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.config.email, Some(&self.config.api_token))
            .send()
            .await?;
        let doc = expect_json(resp, "jira").await?;

        Ok(doc
            .get("comments")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|comment| JiraComment {
                author: comment
                    .pointer("/author/displayName")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown")
                    .to_string(),
                body: str_field(comment, "body"),
            })
            .collect())
    }
}

/// Plain-text rendering of an issue for chunking.
pub fn render_issue(key: &str, summary: &str, description: &str, comments: &[JiraComment]) -> String {
    let mut text = format!("Issue: {key} - {summary}\n\nDescription:\n{description}\n\n");
    if !comments.is_empty() {
        text.push_str("Comments:\n");
        for comment in comments {
            text.push_str(&format!("{}: {}\n\n", comment.author, comment.body));
        }
    }
    text
}

fn must_env(name: &'static str) -> Result<String, ConnectorError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConnectorError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_renders_header_description_and_comments() {
        let comments = vec![JiraComment {
            author: "Ada".to_string(),
            body: "fixed in prod".to_string(),
        }];
        let text = render_issue("OPS-12", "login broken", "users cannot sign in", &comments);
        assert_eq!(
            text,
            "Issue: OPS-12 - login broken\n\nDescription:\nusers cannot sign in\n\nComments:\nAda: fixed in prod\n\n"
        );
    }

    #[test]
    fn issue_without_comments_omits_the_section() {
        let text = render_issue("OPS-1", "s", "d", &[]);
        assert!(!text.contains("Comments:"));
    }
}
