//! Bedrock-style invoke client for text generation and embeddings.
//!
//! Targets an invoke-shaped gateway:
//! - `POST {endpoint}/model/{answer_model}/invoke`    — messages-API generation
//! - `POST {endpoint}/model/{embedding_model}/invoke` — Titan text embeddings
//!
//! Uses the universal configuration [`LlmModelConfig`] and ensures that the
//! selected provider is [`LlmProvider::Bedrock`]. An optional API key is sent
//! as a bearer credential for gateways that front the managed service.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        HttpError, LlmError, ProviderError, ProviderErrorKind, make_snippet,
    },
};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Thin client for a Bedrock-style invoke API.
///
/// Constructed from a complete [`LlmModelConfig`]; keeps a preconfigured
/// `reqwest::Client` with timeout and default headers.
#[derive(Debug)]
pub struct BedrockService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_invoke: String,
}

impl BedrockService {
    /// Creates a new [`BedrockService`] from the given config.
    ///
    /// # Errors
    /// - [`LlmError::Provider`] with `InvalidProvider` if `cfg.provider` is not Bedrock
    /// - [`LlmError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`LlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, LlmError> {
        if cfg.provider != LlmProvider::Bedrock {
            return Err(
                ProviderError::new(cfg.provider, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                cfg.provider,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(api_key) = &cfg.api_key {
            let value =
                header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                    ProviderError::new(
                        cfg.provider,
                        ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                    )
                })?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_invoke = format!("{}/model/{}/invoke", base, cfg.model);

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(60),
            "BedrockService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_invoke,
        })
    }

    /// Generates text via the messages API shape.
    ///
    /// # Errors
    /// - [`LlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`LlmError::HttpTransport`] for client/network failures
    /// - [`LlmError::Provider`] with `Decode`/`EmptyContent` for bad payloads
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError> {
        let started = Instant::now();
        let body = MessagesRequest::from_cfg(&self.cfg, prompt, system);

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            has_system = system.is_some(),
            "POST {}", self.url_invoke
        );

        let resp = self.client.post(&self.url_invoke).json(&body).send().await?;
        let out: MessagesResponse = self.read_json(resp, started).await?;

        let text = out
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| {
                ProviderError::new(self.cfg.provider, ProviderErrorKind::EmptyContent)
            })?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "generation completed"
        );

        Ok(text)
    }

    /// Retrieves a Titan-style embedding vector for one input text.
    ///
    /// # Errors
    /// - [`LlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`LlmError::HttpTransport`] for client/network failures
    /// - [`LlmError::Provider`] with `Decode` if the payload cannot be parsed
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, LlmError> {
        let started = Instant::now();
        let body = EmbeddingsRequest { input_text: input };

        debug!(
            model = %self.cfg.model,
            input_len = input.len(),
            "POST {}", self.url_invoke
        );

        let resp = self.client.post(&self.url_invoke).json(&body).send().await?;
        let out: EmbeddingsResponse = self.read_json(resp, started).await?;

        Ok(out.embedding)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        started: Instant,
    ) -> Result<T, LlmError> {
        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_invoke.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "invoke returned non-success status"
            );

            return Err(ProviderError::new(
                self.cfg.provider,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        resp.json::<T>().await.map_err(|e| {
            ProviderError::new(
                self.cfg.provider,
                ProviderErrorKind::Decode(format!("serde error: {e}")),
            )
            .into()
        })
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Messages-API request body for `/model/{id}/invoke`.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    anthropic_version: &'static str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

impl<'a> MessagesRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        Self {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: cfg.max_tokens.unwrap_or(1000),
            temperature: cfg.temperature,
            system,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock {
                    kind: "text",
                    text: prompt,
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
struct ContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

/// Minimal messages-API response: the answer is in `content[].text`.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlockOut>,
}

#[derive(Debug, Deserialize)]
struct ContentBlockOut {
    text: Option<String>,
}

/// Titan embeddings request body.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    #[serde(rename = "inputText")]
    input_text: &'a str,
}

/// Titan embeddings response body.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}
