use std::sync::Arc;

use llm_service::LlmProfiles;
use retrieval::{RetrievalConfig, VectorIndex};

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Answer + embedding profiles, client cache inside.
    pub llm: Arc<LlmProfiles>,
    /// Vector index client bound to the configured cluster and index.
    pub index: Arc<VectorIndex>,
}

impl AppState {
    pub fn new(llm: Arc<LlmProfiles>, index: Arc<VectorIndex>) -> Self {
        Self { llm, index }
    }

    /// Load shared state from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        let llm = LlmProfiles::from_env().map_err(|e| AppError::Config(e.to_string()))?;
        let retrieval_config =
            RetrievalConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;
        let index =
            VectorIndex::new(&retrieval_config).map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self::new(Arc::new(llm), Arc::new(index)))
    }
}
