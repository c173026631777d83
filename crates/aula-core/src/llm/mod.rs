//! Text-generation service seam.

mod ollama;

pub use ollama::OllamaClient;

use async_trait::async_trait;

use crate::error::Result;

/// Abstraction over the local text-generation service.
///
/// The production implementation talks to an Ollama-compatible HTTP API;
/// tests substitute a mock so handler contracts can be checked without a
/// running service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`, returning the raw text.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Cheap reachability probe. `Ok(())` means the service answered.
    async fn probe(&self) -> Result<()>;
}
