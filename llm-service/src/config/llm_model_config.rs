use crate::config::llm_provider::LlmProvider;

/// Configuration for one model invocation profile.
///
/// Contains both general and provider-specific parameters; extend as needed
/// to support new backends.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier (e.g., `"anthropic.claude-3-haiku-20240307-v1:0"`).
    pub model: String,

    /// Inference endpoint (gateway URL or local runtime URL).
    pub endpoint: String,

    /// Optional API key for authenticated gateways.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
