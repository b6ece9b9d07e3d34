//! LLM module - Language Model integrations
//!
//! Provides one provider trait with an OpenAI-compatible client and an
//! Ollama client behind it.

pub mod ollama;
pub mod provider;
pub mod traits;

pub use ollama::OllamaClient;
pub use provider::{create_provider, OpenAiClient};
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
