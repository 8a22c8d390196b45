//! Health checks for LLM backends.
//!
//! - Bedrock: `GET {endpoint}/foundation-models` (reachability probe)
//! - Ollama:  `GET {endpoint}/api/tags` (best-effort model existence check)
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a
//! `/health` endpoint. [`HealthService::check`] is resilient and never fails
//! (errors are mapped to `ok = false`).

use std::time::{Duration, Instant};

use reqwest::header;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{HttpError, LlmError, ProviderError, ProviderErrorKind, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "Bedrock", "Ollama").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn from_result(
        cfg: &LlmModelConfig,
        ok: bool,
        latency_ms: u128,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// A health checker that reuses a single HTTP client across probes.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// [`LlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks health for a single config; never returns an error.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return HealthStatus::from_result(
                cfg,
                false,
                0,
                "endpoint is empty or missing http/https",
            );
        }

        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Bedrock => self.try_probe_bedrock(cfg).await,
            LlmProvider::Ollama => self.try_probe_ollama(cfg).await,
        };
        let latency = start.elapsed().as_millis();

        match result {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status = HealthStatus::from_result(cfg, false, latency, err.to_string());
                warn!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Checks health for multiple configs; each failure becomes `ok = false`.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// Strict Bedrock probe: `GET {endpoint}/foundation-models`.
    async fn try_probe_bedrock(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, LlmError> {
        let url = format!("{}/foundation-models", cfg.endpoint.trim_end_matches('/'));
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let start = Instant::now();
        let mut req = self.client.get(&url).timeout(timeout);
        if let Some(api_key) = &cfg.api_key {
            req = req.header(header::AUTHORIZATION, format!("Bearer {api_key}"));
        }
        let resp = req.send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                cfg.provider,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet: make_snippet(&text),
                }),
            )
            .into());
        }

        Ok(HealthStatus::from_result(
            cfg,
            true,
            latency,
            "inference endpoint is reachable",
        ))
    }

    /// Strict Ollama probe: `GET {endpoint}/api/tags` with a best-effort
    /// model existence check.
    async fn try_probe_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, LlmError> {
        let url = format!("{}/api/tags", cfg.endpoint.trim_end_matches('/'));
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let start = Instant::now();
        let resp = self.client.get(&url).timeout(timeout).send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                cfg.provider,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet: make_snippet(&text),
                }),
            )
            .into());
        }

        // Expected minimal JSON: { "models": [ { "name": "<model>" }, ... ] }
        #[derive(serde::Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(serde::Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        match resp.json::<Tags>().await {
            Ok(Tags {
                models: Some(models),
            }) => {
                if models.iter().any(|m| m.name == cfg.model) {
                    Ok(HealthStatus::from_result(
                        cfg,
                        true,
                        latency,
                        "Ollama is healthy; model is available",
                    ))
                } else {
                    Ok(HealthStatus::from_result(
                        cfg,
                        false,
                        latency,
                        "Ollama is up, but model not found in /api/tags",
                    ))
                }
            }
            Ok(_) => Ok(HealthStatus::from_result(
                cfg,
                true,
                latency,
                "Ollama is healthy; tags response without `models` field",
            )),
            Err(e) => Ok(HealthStatus::from_result(
                cfg,
                true,
                latency,
                format!("Ollama is reachable; failed to decode /api/tags: {e}"),
            )),
        }
    }
}
