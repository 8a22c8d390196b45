//! Shared LLM service with two active profiles: `answer` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+key+timeout).
//! - Provides convenience methods to generate the answer and to compute
//!   embeddings for queries and document chunks.

use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::Arc,
};

use tokio::sync::RwLock;

use crate::{
    config::{
        default_config::{config_answer, config_embedding},
        llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::LlmError,
    health_service::{HealthService, HealthStatus},
    services::{bedrock_service::BedrockService, ollama_service::OllamaService},
};

/// Shared service that manages the **answer** and **embedding** profiles.
///
/// Internally caches Bedrock/Ollama clients keyed by their configuration to
/// avoid recreating HTTP clients on each call.
pub struct LlmProfiles {
    answer: LlmModelConfig,
    embedding: LlmModelConfig,

    bedrock: RwLock<HashMap<ClientKey, Arc<BedrockService>>>,
    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,

    health: HealthService,
}

impl LlmProfiles {
    /// Creates a new service with explicit profiles.
    pub fn new(
        answer: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            answer,
            embedding,
            bedrock: RwLock::new(HashMap::new()),
            ollama: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Builds both profiles strictly from environment variables.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(config_answer()?, config_embedding()?, Some(10))
    }

    /// Generates text using the **answer** profile.
    ///
    /// # Errors
    /// Returns [`LlmError`] if generation fails.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError> {
        match self.answer.provider {
            LlmProvider::Bedrock => {
                let cli = self.get_or_init_bedrock(&self.answer).await?;
                cli.generate(prompt, system).await
            }
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(&self.answer).await?;
                cli.generate(prompt, system).await
            }
        }
    }

    /// Computes an embedding using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`LlmError`] if embedding fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, LlmError> {
        match self.embedding.provider {
            LlmProvider::Bedrock => {
                let cli = self.get_or_init_bedrock(&self.embedding).await?;
                cli.embeddings(input).await
            }
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(&self.embedding).await?;
                cli.embeddings(input).await
            }
        }
    }

    /// Returns a health snapshot for all distinct profiles.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = Vec::with_capacity(2);
        list.push(self.answer.clone());
        if self.embedding != self.answer {
            list.push(self.embedding.clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(answer, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.answer, &self.embedding)
    }

    /* --------------------- Internals --------------------- */

    async fn get_or_init_bedrock(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<BedrockService>, LlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.bedrock.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let built = Arc::new(BedrockService::new(cfg.clone())?);
        let mut w = self.bedrock.write().await;
        Ok(w.entry(key).or_insert(built).clone())
    }

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, LlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let built = Arc::new(OllamaService::new(cfg.clone())?);
        let mut w = self.ollama.write().await;
        Ok(w.entry(key).or_insert(built).clone())
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}
