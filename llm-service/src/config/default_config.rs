//! Default model configs loaded strictly from environment variables.
//!
//! Two roles are active:
//!
//! - **Answer**    → generation model used for the RAG answer
//! - **Embedding** → embedding generator for queries and document chunks
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_PROVIDER`   = `bedrock` (default) or `ollama`
//! - `LLM_MAX_TOKENS` = optional max tokens for the answer model (u32)
//!
//! Bedrock-specific:
//! - `BEDROCK_ENDPOINT`   = invoke-style gateway URL (mandatory)
//! - `BEDROCK_API_KEY`    = optional bearer credential
//! - `ANSWER_MODEL_ID`    = answer model (default Claude 3 Haiku)
//! - `EMBEDDING_MODEL_ID` = embedding model (default Titan v1)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = answer model (mandatory)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        ConfigError, LlmError, env_opt_u32, must_env, validate_http_endpoint,
    },
};

const DEFAULT_ANSWER_MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";
const DEFAULT_EMBEDDING_MODEL: &str = "amazon.titan-embed-text-v1";

/// Resolves the provider from `LLM_PROVIDER` (defaults to Bedrock).
pub fn provider_from_env() -> Result<LlmProvider, LlmError> {
    match std::env::var("LLM_PROVIDER") {
        Ok(v) if !v.trim().is_empty() => match v.trim().to_ascii_lowercase().as_str() {
            "bedrock" => Ok(LlmProvider::Bedrock),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
        },
        _ => Ok(LlmProvider::Bedrock),
    }
}

/// Constructs the **answer** profile from the environment.
///
/// # Defaults
/// - `temperature = Some(0.7)`
/// - `max_tokens = Some(1000)` unless `LLM_MAX_TOKENS` overrides it
pub fn config_answer() -> Result<LlmModelConfig, LlmError> {
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?.or(Some(1000));

    match provider_from_env()? {
        LlmProvider::Bedrock => {
            let endpoint = must_env("BEDROCK_ENDPOINT")?;
            validate_http_endpoint("BEDROCK_ENDPOINT", &endpoint)?;
            let model = std::env::var("ANSWER_MODEL_ID")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ANSWER_MODEL.to_string());

            Ok(LlmModelConfig {
                provider: LlmProvider::Bedrock,
                model,
                endpoint,
                api_key: optional_env("BEDROCK_API_KEY"),
                max_tokens,
                temperature: Some(0.7),
                top_p: None,
                timeout_secs: Some(300),
            })
        }
        LlmProvider::Ollama => {
            let endpoint = ollama_endpoint()?;
            let model = must_env("OLLAMA_MODEL")?;

            Ok(LlmModelConfig {
                provider: LlmProvider::Ollama,
                model,
                endpoint,
                api_key: None,
                max_tokens,
                temperature: Some(0.7),
                top_p: Some(0.9),
                timeout_secs: Some(300),
            })
        }
    }
}

/// Constructs the **embedding** profile from the environment.
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `timeout_secs = Some(30)`
pub fn config_embedding() -> Result<LlmModelConfig, LlmError> {
    match provider_from_env()? {
        LlmProvider::Bedrock => {
            let endpoint = must_env("BEDROCK_ENDPOINT")?;
            validate_http_endpoint("BEDROCK_ENDPOINT", &endpoint)?;
            let model = std::env::var("EMBEDDING_MODEL_ID")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

            Ok(LlmModelConfig {
                provider: LlmProvider::Bedrock,
                model,
                endpoint,
                api_key: optional_env("BEDROCK_API_KEY"),
                max_tokens: None,
                temperature: Some(0.0),
                top_p: None,
                timeout_secs: Some(30),
            })
        }
        LlmProvider::Ollama => {
            let endpoint = ollama_endpoint()?;
            let model = must_env("EMBEDDING_MODEL")?;

            Ok(LlmModelConfig {
                provider: LlmProvider::Ollama,
                model,
                endpoint,
                api_key: None,
                max_tokens: None,
                temperature: Some(0.0),
                top_p: None,
                timeout_secs: Some(30),
            })
        }
    }
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, LlmError> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            let _ = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "OLLAMA_PORT",
                    reason: "expected u16 (1..=65535)",
                })?;
            return Ok(format!("http://localhost:{port}"));
        }
    }
    Err(LlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}
