//! Slack connector: channel listing, history, and thread replies.
//!
//! One document per channel; messages are rendered as `User: {name}` blocks
//! joined by blank lines. Slack wraps every response in an `ok` envelope, so
//! each call checks it before reading the payload.

use std::collections::HashMap;
use std::env;

use chrono::{Duration, Utc};
use query_client::SourceType;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::document::Document;
use crate::errors::connector_error::ConnectorError;
use crate::http::{expect_json, str_field};

const DEFAULT_API_BASE: &str = "https://slack.com/api";
const DEFAULT_DAYS_BACK: i64 = 7;
const DEFAULT_CHANNEL_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    /// Channel names to sync; empty means "first N public channels".
    pub channels: Vec<String>,
    /// History window in days.
    pub days_back: i64,
    pub api_base: String,
}

impl SlackConfig {
    pub fn from_env() -> Result<Self, ConnectorError> {
        let bot_token = env::var("SLACK_BOT_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConnectorError::MissingVar("SLACK_BOT_TOKEN"))?;
        let channels = env::var("SLACK_CHANNELS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let days_back = env::var("SLACK_DAYS_BACK")
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_DAYS_BACK);
        Ok(Self {
            bot_token,
            channels,
            days_back,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }
}

/// One rendered message (thread replies are flattened in after their parent).
#[derive(Debug, Clone, PartialEq)]
pub struct SlackMessage {
    pub user: String,
    pub text: String,
}

pub struct SlackConnector {
    client: reqwest::Client,
    config: SlackConfig,
}

impl SlackConnector {
    pub fn new(config: SlackConfig) -> Result<Self, ConnectorError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            config,
        })
    }

    pub fn from_env() -> Result<Self, ConnectorError> {
        Self::new(SlackConfig::from_env()?)
    }

    /// Fetches up to `limit` channels as documents. Channels whose history
    /// cannot be read are skipped.
    pub async fn fetch(&self, limit: usize) -> Result<Vec<Document>, ConnectorError> {
        let all_channels = self.list_channels().await?;
        let selected: Vec<&(String, String)> = if self.config.channels.is_empty() {
            all_channels.iter().take(limit).collect()
        } else {
            all_channels
                .iter()
                .filter(|(_, name)| self.config.channels.contains(name))
                .take(limit)
                .collect()
        };

        let mut user_names: HashMap<String, String> = HashMap::new();
        let mut documents = Vec::with_capacity(selected.len());
        for (channel_id, channel_name) in selected {
            let messages = match self.channel_messages(channel_id, &mut user_names).await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(target: "connectors", channel = %channel_name, error = %e, "skipping channel");
                    continue;
                }
            };
            if messages.is_empty() {
                continue;
            }
            documents.push(Document {
                origin_id: channel_id.clone(),
                source: SourceType::Slack,
                title: format!("Slack Channel: {channel_name}"),
                url: format!("https://slack.com/archives/{channel_id}"),
                text: render_channel(&messages),
                metadata: json!({
                    "channel": channel_name,
                    "message_count": messages.len(),
                }),
            });
        }

        info!(target: "connectors", channels = documents.len(), "fetched slack channels");
        Ok(documents)
    }

    /* --- Internals --- */

    async fn call(&self, method: &str, params: &[(&str, String)]) -> Result<Value, ConnectorError> {
        let url = format!("{}/{}", self.config.api_base, method);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.config.bot_token)
            .query(params)
            .send()
            .await?;
        let doc = expect_json(resp, "slack").await?;
        if doc.get("ok").and_then(Value::as_bool) != Some(true) {
            return Err(ConnectorError::Api {
                source_name: "slack",
                message: str_field(&doc, "error"),
            });
        }
        Ok(doc)
    }

    /// Returns `(id, name)` for every public channel, following cursors.
    async fn list_channels(&self) -> Result<Vec<(String, String)>, ConnectorError> {
        let mut channels = Vec::new();
        let mut cursor = String::new();
        loop {
            let mut params = vec![
                ("types", "public_channel".to_string()),
                ("limit", "100".to_string()),
            ];
            if !cursor.is_empty() {
                params.push(("cursor", cursor.clone()));
            }
            let doc = self.call("conversations.list", &params).await?;
            if let Some(list) = doc.get("channels").and_then(Value::as_array) {
                for channel in list {
                    channels.push((str_field(channel, "id"), str_field(channel, "name")));
                }
            }
            cursor = doc
                .pointer("/response_metadata/next_cursor")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if cursor.is_empty() {
                break;
            }
        }
        Ok(channels)
    }

    async fn channel_messages(
        &self,
        channel_id: &str,
        user_names: &mut HashMap<String, String>,
    ) -> Result<Vec<SlackMessage>, ConnectorError> {
        let oldest = (Utc::now() - Duration::days(self.config.days_back)).timestamp();
        let mut messages = Vec::new();
        let mut cursor = String::new();
        loop {
            let mut params = vec![
                ("channel", channel_id.to_string()),
                ("oldest", oldest.to_string()),
                ("limit", "100".to_string()),
            ];
            if !cursor.is_empty() {
                params.push(("cursor", cursor.clone()));
            }
            let doc = self.call("conversations.history", &params).await?;

            for msg in doc
                .get("messages")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                let text = str_field(msg, "text");
                if text.trim().is_empty() {
                    continue;
                }
                let user = self.resolve_user(&str_field(msg, "user"), user_names).await;
                messages.push(SlackMessage { user, text });

                let reply_count = msg.get("reply_count").and_then(Value::as_u64).unwrap_or(0);
                if reply_count > 0 {
                    let ts = str_field(msg, "ts");
                    match self.thread_replies(channel_id, &ts, user_names).await {
                        Ok(replies) => messages.extend(replies),
                        Err(e) => {
                            warn!(target: "connectors", channel = %channel_id, ts = %ts, error = %e, "skipping thread");
                        }
                    }
                }
            }

            cursor = doc
                .pointer("/response_metadata/next_cursor")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if cursor.is_empty() {
                break;
            }
        }
        Ok(messages)
    }

    async fn thread_replies(
        &self,
        channel_id: &str,
        ts: &str,
        user_names: &mut HashMap<String, String>,
    ) -> Result<Vec<SlackMessage>, ConnectorError> {
        let params = vec![
            ("channel", channel_id.to_string()),
            ("ts", ts.to_string()),
        ];
        let doc = self.call("conversations.replies", &params).await?;
        let mut replies = Vec::new();
        // First entry is the parent message, already collected.
        for msg in doc
            .get("messages")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .skip(1)
        {
            let text = str_field(msg, "text");
            if text.trim().is_empty() {
                continue;
            }
            let user = self.resolve_user(&str_field(msg, "user"), user_names).await;
            replies.push(SlackMessage { user, text });
        }
        Ok(replies)
    }

    /// Resolves a user id to a display name, caching per sync. Falls back to
    /// the raw id when the lookup fails.
    async fn resolve_user(&self, user_id: &str, cache: &mut HashMap<String, String>) -> String {
        if user_id.is_empty() {
            return "Unknown".to_string();
        }
        if let Some(name) = cache.get(user_id) {
            return name.clone();
        }
        let name = match self
            .call("users.info", &[("user", user_id.to_string())])
            .await
        {
            Ok(doc) => {
                let real = doc
                    .pointer("/user/real_name")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty());
                let login = doc.pointer("/user/name").and_then(Value::as_str);
                real.or(login).unwrap_or(user_id).to_string()
            }
            Err(_) => user_id.to_string(),
        };
        cache.insert(user_id.to_string(), name.clone());
        name
    }
}

/// Plain-text rendering of a channel's messages for chunking.
pub fn render_channel(messages: &[SlackMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("User: {}\n{}", m.user, m.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render_as_user_blocks() {
        let messages = vec![
            SlackMessage {
                user: "Ada".to_string(),
                text: "deploy is done".to_string(),
            },
            SlackMessage {
                user: "Grace".to_string(),
                text: "thanks!".to_string(),
            },
        ];
        assert_eq!(
            render_channel(&messages),
            "User: Ada\ndeploy is done\n\nUser: Grace\nthanks!"
        );
    }

    #[test]
    fn empty_channel_renders_empty() {
        assert_eq!(render_channel(&[]), "");
    }
}
