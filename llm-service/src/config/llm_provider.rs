/// Backend used for LLM inference and embeddings.
///
/// `Bedrock` targets a managed invoke-style API (`POST /model/{id}/invoke`);
/// `Ollama` targets a local runtime for development without cloud access.
/// New backends are added by extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Managed inference endpoint (Titan embeddings, Claude-style messages).
    Bedrock,
    /// Local Ollama runtime for on-device inference.
    Ollama,
}
