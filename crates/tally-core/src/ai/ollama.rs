//! Ollama backend implementation
//!
//! HTTP client for the Ollama generate API. All calls are non-streaming and
//! bounded by a request timeout; callers fall back to locally computed text
//! when a call errors or times out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{AdviceKind, StatsSnapshot};

use super::prompts;
use super::AiBackend;

/// Default request timeout for generation calls
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend with the default timeout
    pub fn new(base_url: &str, model: &str) -> Self {
        Self::with_timeout(base_url, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create with an explicit request timeout
    pub fn with_timeout(base_url: &str, model: &str, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        let timeout = std::env::var("TALLY_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Some(Self::with_timeout(
            &host,
            &model,
            Duration::from_secs(timeout),
        ))
    }

    /// Send one prompt and return the generated text
    async fn generate(&self, prompt: String) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Ollama returned {}",
                response.status()
            )));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama response: {}", ollama_response.response);

        let text = ollama_response.response.trim().to_string();
        if text.is_empty() {
            return Err(Error::Upstream("Empty response from Ollama".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl AiBackend for OllamaBackend {
    async fn generate_advice(&self, kind: AdviceKind, stats: &StatsSnapshot) -> Result<String> {
        self.generate(prompts::advice_prompt(kind, stats)).await
    }

    async fn categorize(&self, description: &str) -> Result<String> {
        let raw = self.generate(prompts::categorize_prompt(description)).await?;
        // Models occasionally wrap the answer in quotes or add a newline
        let category = raw.replace(['"', '\n'], "").trim().to_string();
        if prompts::CATEGORIES.contains(&category.as_str()) {
            Ok(category)
        } else {
            Err(Error::Upstream(format!(
                "Unrecognized category from model: {}",
                category
            )))
        }
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        self.generate(prompt.to_string()).await
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn host(&self) -> &str {
        &self.base_url
    }

    fn model(&self) -> &str {
        &self.model
    }
}
