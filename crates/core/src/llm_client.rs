use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// A generic client for a text-generation backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Makes a single, non-streaming generation call and returns the raw generated text.
    async fn generate(&self, prompt: String) -> Result<String>;
}

/// Request body for Ollama's `/api/generate` endpoint.
#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    response: String,
}

/// An implementation of `GenerationClient` for a local Ollama server.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Creates a new client for an Ollama server.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root URL of the server (e.g., "http://localhost:11434").
    /// * `model` - The model identifier to generate with (e.g., "mistral").
    /// * `timeout` - Upper bound on a single generation round trip.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for generation backend")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn generate(&self, prompt: String) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
            format: "json",
        };

        debug!(%url, model = %self.model, "Sending generation request");
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Generation request to {url} failed"))?
            .error_for_status()
            .context("Generation backend returned an error status")?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Generation backend response had no `response` field")?;
        Ok(parsed.response)
    }
}
