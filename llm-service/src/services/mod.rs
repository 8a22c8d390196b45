pub mod bedrock_service;
pub mod ollama_service;
