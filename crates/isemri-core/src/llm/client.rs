//! Blocking HTTP client for an Ollama-compatible generation endpoint.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::GenerationService;
use crate::error::GenerationError;
use crate::models::LlmConfig;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for the `/api/generate` endpoint of a local Ollama server.
pub struct OllamaClient {
    client: reqwest::blocking::Client,
    host: String,
    model: String,
}

impl OllamaClient {
    /// Build a client with the configured request timeout.
    pub fn new(config: &LlmConfig) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

impl GenerationService for OllamaClient {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.host);
        debug!("sending {} chars of prompt to {}", prompt.len(), url);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status(status.as_u16()));
        }

        let body: GenerateResponse = response
            .json()
            .map_err(|_| GenerationError::Unreadable)?;
        Ok(body.response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
