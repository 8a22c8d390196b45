//! GitHub connector: repositories with README, recent issues, and PRs.

use std::env;

use query_client::SourceType;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::document::Document;
use crate::errors::connector_error::ConnectorError;
use crate::http::{expect_json, str_field};

const DEFAULT_API_BASE: &str = "https://api.github.com";
/// Issue/PR summaries included in a repository document.
const RENDERED_ITEMS: usize = 10;

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: String,
    /// Organization to sync; `None` means the token's own repositories.
    pub org: Option<String>,
    pub api_base: String,
}

impl GitHubConfig {
    pub fn from_env() -> Result<Self, ConnectorError> {
        let token = env::var("GITHUB_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConnectorError::MissingVar("GITHUB_TOKEN"))?;
        Ok(Self {
            token,
            org: env::var("GITHUB_ORG").ok().filter(|v| !v.trim().is_empty()),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }
}

/// Issue or PR summary used in rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSummary {
    pub number: u64,
    pub title: String,
    pub body: String,
}

pub struct GitHubConnector {
    client: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubConnector {
    pub fn new(config: GitHubConfig) -> Result<Self, ConnectorError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.token)).map_err(|_| {
            ConnectorError::InvalidFormat {
                var: "GITHUB_TOKEN",
                reason: "contains characters not valid in a header",
            }
        })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("vaultiq-backend"));

        Ok(Self {
            client: reqwest::Client::builder().default_headers(headers).build()?,
            config,
        })
    }

    pub fn from_env() -> Result<Self, ConnectorError> {
        Self::new(GitHubConfig::from_env()?)
    }

    /// Fetches up to `limit` repositories as documents. Repositories whose
    /// detail calls fail are skipped.
    pub async fn fetch(&self, limit: usize) -> Result<Vec<Document>, ConnectorError> {
        let repos_url = match &self.config.org {
            Some(org) => format!("{}/orgs/{org}/repos", self.config.api_base),
            None => format!("{}/user/repos", self.config.api_base),
        };
        let resp = self
            .client
            .get(&repos_url)
            .query(&[("per_page", "100")])
            .send()
            .await?;
        let repos = expect_json(resp, "github").await?;
        let repos = repos.as_array().cloned().unwrap_or_default();

        let mut documents = Vec::new();
        for repo in repos.iter().take(limit) {
            let full_name = str_field(repo, "full_name");
            if full_name.is_empty() {
                continue;
            }
            match self.build_document(repo, &full_name).await {
                Ok(document) => documents.push(document),
                Err(e) => {
                    warn!(target: "connectors", repo = %full_name, error = %e, "skipping repository");
                }
            }
        }

        info!(target: "connectors", repositories = documents.len(), "fetched github repositories");
        Ok(documents)
    }

    /* --- Internals --- */

    async fn build_document(
        &self,
        repo: &Value,
        full_name: &str,
    ) -> Result<Document, ConnectorError> {
        let description = str_field(repo, "description");
        let readme = self.fetch_readme(full_name).await;
        let issues = self.fetch_issues(full_name).await?;
        let pulls = self.fetch_pulls(full_name).await?;

        Ok(Document {
            origin_id: full_name.to_string(),
            source: SourceType::GitHub,
            title: full_name.to_string(),
            url: str_field(repo, "html_url"),
            text: render_repository(full_name, &description, &readme, &issues, &pulls),
            metadata: json!({
                "language": str_field(repo, "language"),
                "default_branch": str_field(repo, "default_branch"),
            }),
        })
    }

    /// Raw README content; missing README becomes empty text.
    async fn fetch_readme(&self, full_name: &str) -> String {
        let url = format!("{}/repos/{full_name}/readme", self.config.api_base);
        let result = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github.raw")
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => resp.text().await.unwrap_or_default(),
            _ => String::new(),
        }
    }

    async fn fetch_issues(&self, full_name: &str) -> Result<Vec<ItemSummary>, ConnectorError> {
        let url = format!("{}/repos/{full_name}/issues", self.config.api_base);
        let resp = self
            .client
            .get(&url)
            .query(&[("state", "all"), ("per_page", "50")])
            .send()
            .await?;
        let items = expect_json(resp, "github").await?;
        Ok(items
            .as_array()
            .into_iter()
            .flatten()
            // The issues endpoint interleaves PRs; those carry a
            // `pull_request` key.
            .filter(|item| item.get("pull_request").is_none())
            .map(item_summary)
            .collect())
    }

    async fn fetch_pulls(&self, full_name: &str) -> Result<Vec<ItemSummary>, ConnectorError> {
        let url = format!("{}/repos/{full_name}/pulls", self.config.api_base);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("state", "all"),
                ("per_page", "50"),
                ("sort", "updated"),
                ("direction", "desc"),
            ])
            .send()
            .await?;
        let items = expect_json(resp, "github").await?;
        Ok(items.as_array().into_iter().flatten().map(item_summary).collect())
    }
}

fn item_summary(item: &Value) -> ItemSummary {
    ItemSummary {
        number: item.get("number").and_then(Value::as_u64).unwrap_or(0),
        title: str_field(item, "title"),
        body: str_field(item, "body"),
    }
}

/// Plain-text rendering of a repository for chunking. Only the first ten
/// issues and PRs are included.
pub fn render_repository(
    full_name: &str,
    description: &str,
    readme: &str,
    issues: &[ItemSummary],
    pulls: &[ItemSummary],
) -> String {
    let mut text = format!("Repository: {full_name}\n\nDescription: {description}\n\nREADME:\n{readme}\n\n");
    if !issues.is_empty() {
        text.push_str("Recent Issues:\n");
        for issue in issues.iter().take(RENDERED_ITEMS) {
            text.push_str(&format!("#{}: {}\n{}\n\n", issue.number, issue.title, issue.body));
        }
    }
    if !pulls.is_empty() {
        text.push_str("Recent Pull Requests:\n");
        for pr in pulls.iter().take(RENDERED_ITEMS) {
            text.push_str(&format!("#{}: {}\n{}\n\n", pr.number, pr.title, pr.body));
        }
    }
    text
}
