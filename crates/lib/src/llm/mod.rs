//! Completion model abstraction and OpenAI-compatible client.
//!
//! The coach only needs one shape of call: a system instruction, one user message and an
//! output budget. `TextGenerator` is that seam; tests swap in canned generators.

mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm api error: {0}")]
    Api(String),
    #[error("llm response malformed: {0}")]
    Malformed(String),
    #[error("llm not configured: {0}")]
    NotConfigured(String),
}

/// One-shot completion: system instruction + user message, bounded output.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError>;
}
