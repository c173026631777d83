//! Ollama-compatible HTTP client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::llm::TextGenerator;

/// Client for a local Ollama-compatible text-generation service.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            // Generation on CPU-bound hosts can take minutes; no retries.
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| Error::UpstreamModel(format!("failed to build HTTP client: {e}")))?;

        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "text generation request");

        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .http
            .post(self.endpoint("/api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::UpstreamModel(format!("text-generation request failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::UpstreamModel(format!("text-generation service error: {e}")))?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::UpstreamModel(format!("invalid text-generation response: {e}")))?;

        Ok(parsed.response)
    }

    async fn probe(&self) -> Result<()> {
        self.http
            .get(self.endpoint("/api/tags"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| Error::UpstreamModel(format!("text-generation service unreachable: {e}")))?
            .error_for_status()
            .map_err(|e| Error::UpstreamModel(format!("text-generation service error: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_response_parses() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"response":"hello","done":true,"model":"llama3"}"#).unwrap();
        assert_eq!(parsed.response, "hello");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3").unwrap();
        assert_eq!(client.endpoint("/api/tags"), "http://localhost:11434/api/tags");
    }
}
