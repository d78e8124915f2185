//! LLM and embedding provider abstraction.
//!
//! The pipeline depends on three narrow capabilities: strict-JSON chat
//! completion, single-text embedding, and ordered batch embedding. The
//! trait is object-safe for use as `Arc<dyn LlmClient>`; tests swap in
//! mock implementations.

pub mod openai_compat;

use crate::error::LlmError;

/// Parameters controlling a completion request.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature. Extraction runs cold (0.1).
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.1,
        }
    }
}

/// Trait abstracting the LLM and embedding provider.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// The chat model identifier, stamped onto extraction records.
    fn model(&self) -> &str;

    /// Request a completion in JSON output mode and parse the response
    /// body into a JSON value. A non-JSON response is a [`LlmError::Parse`].
    async fn extract_json(
        &self,
        system: &str,
        user: &str,
        params: &GenerationParams,
    ) -> Result<serde_json::Value, LlmError>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, LlmError>;

    /// Embed multiple texts. The output order matches the input order.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}
