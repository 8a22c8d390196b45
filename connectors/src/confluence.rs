//! Confluence connector: CQL page search, then page-by-id expansion.

use std::env;

use query_client::SourceType;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::document::Document;
use crate::errors::connector_error::ConnectorError;
use crate::http::{expect_json, str_field};

#[derive(Debug, Clone)]
pub struct ConfluenceConfig {
    pub base_url: String,
    pub username: String,
    pub api_key: String,
    /// Restrict the CQL search to one space.
    pub space_key: Option<String>,
}

impl ConfluenceConfig {
    pub fn from_env() -> Result<Self, ConnectorError> {
        Ok(Self {
            base_url: must_env("CONFLUENCE_URL")?
                .trim_end_matches('/')
                .to_string(),
            username: must_env("CONFLUENCE_USERNAME")?,
            api_key: must_env("CONFLUENCE_API_KEY")?,
            space_key: env::var("CONFLUENCE_SPACE_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }
}

pub struct ConfluenceConnector {
    client: reqwest::Client,
    config: ConfluenceConfig,
}

impl ConfluenceConnector {
    pub fn new(config: ConfluenceConfig) -> Result<Self, ConnectorError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            config,
        })
    }

    pub fn from_env() -> Result<Self, ConnectorError> {
        Self::new(ConfluenceConfig::from_env()?)
    }

    /// Fetches up to `limit` pages, skipping pages whose expansion fails.
    pub async fn fetch(&self, limit: usize) -> Result<Vec<Document>, ConnectorError> {
        let cql = match &self.config.space_key {
            Some(key) => format!("type=page AND space=\"{key}\""),
            None => "type=page".to_string(),
        };

        let url = format!("{}/rest/api/content/search", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.api_key))
            .query(&[("cql", cql.as_str()), ("limit", &limit.to_string())])
            .send()
            .await?;
        let doc = expect_json(resp, "confluence").await?;

        let results = doc
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut documents = Vec::with_capacity(results.len());
        for result in &results {
            let page_id = result
                .pointer("/content/id")
                .or_else(|| result.get("id"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if page_id.is_empty() {
                continue;
            }
            match self.fetch_page(&page_id).await {
                Ok(document) => documents.push(document),
                Err(e) => {
                    warn!(target: "connectors", page_id = %page_id, error = %e, "skipping page");
                }
            }
        }

        info!(target: "connectors", pages = documents.len(), "fetched confluence pages");
        Ok(documents)
    }

    /* --- Internals --- */

    async fn fetch_page(&self, page_id: &str) -> Result<Document, ConnectorError> {
        let url = format!("{}/rest/api/content/{page_id}", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.api_key))
            .query(&[("expand", "body.storage,version,space")])
            .send()
            .await?;
        let page = expect_json(resp, "confluence").await?;

        let title = str_field(&page, "title");
        let content = page
            .pointer("/body/storage/value")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let webui = page
            .pointer("/_links/webui")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Ok(Document {
            origin_id: page_id.to_string(),
            source: SourceType::Confluence,
            title: title.clone(),
            url: format!("{}{webui}", self.config.base_url),
            text: render_page(&title, content),
            metadata: json!({
                "space": page.pointer("/space/name").and_then(Value::as_str).unwrap_or_default(),
                "space_key": page.pointer("/space/key").and_then(Value::as_str).unwrap_or_default(),
                "version": page.pointer("/version/number").and_then(Value::as_u64).unwrap_or(0),
            }),
        })
    }
}

/// Plain-text rendering of a page for chunking.
pub fn render_page(title: &str, content: &str) -> String {
    format!("Title: {title}\n\n{content}")
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
    fn page_renders_title_then_body() {
        let text = render_page("Deploy Runbook", "step one\nstep two");
        assert_eq!(text, "Title: Deploy Runbook\n\nstep one\nstep two");
    }
}
