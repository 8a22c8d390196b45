//! Source connectors: fetch and normalize documents from Confluence,
//! Slack, Jira, and GitHub for the ingest pipeline.

pub mod confluence;
pub mod document;
pub mod errors;
pub mod github;
pub mod jira;
pub mod slack;

mod http;

use query_client::SourceType;

pub use confluence::ConfluenceConnector;
pub use document::Document;
pub use errors::connector_error::ConnectorError;
pub use github::GitHubConnector;
pub use jira::JiraConnector;
pub use slack::SlackConnector;

/// Default fetch limits per source when the caller does not pass one.
/// Confluence/Jira count items, Slack counts channels, GitHub counts
/// repositories.
pub fn default_limit(source: SourceType) -> usize {
    match source {
        SourceType::Confluence => 100,
        SourceType::Slack => 10,
        SourceType::Jira => 100,
        SourceType::GitHub => 10,
    }
}

/// Builds the matching connector from the environment and runs one fetch.
pub async fn fetch_documents(
    source: SourceType,
    limit: Option<usize>,
) -> Result<Vec<Document>, ConnectorError> {
    let limit = limit.unwrap_or_else(|| default_limit(source));
    match source {
        SourceType::Confluence => ConfluenceConnector::from_env()?.fetch(limit).await,
        SourceType::Slack => SlackConnector::from_env()?.fetch(limit).await,
        SourceType::Jira => JiraConnector::from_env()?.fetch(limit).await,
        SourceType::GitHub => GitHubConnector::from_env()?.fetch(limit).await,
    }
}
