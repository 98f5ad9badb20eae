//! Text-generation model trait.
//!
//! One rendered prompt in, one free-text response out. Concrete clients
//! (OpenAI-compatible, Ollama) live in the `memetrend` app crate; tests
//! supply canned implementations.

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;
    /// Send `prompt` as a single user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
