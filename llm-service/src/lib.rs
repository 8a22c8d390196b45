//! Shared LLM service with providers (Bedrock-style invoke gateway, local
//! Ollama), unified errors, health checks, and answer/embedding profiles.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::LlmError;
pub use health_service::HealthStatus;
pub use service_profiles::LlmProfiles;
