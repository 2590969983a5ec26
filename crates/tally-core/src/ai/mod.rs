//! Pluggable AI backend abstraction
//!
//! This module provides a backend-agnostic interface for the advice,
//! categorization, and chat features.
//!
//! # Architecture
//!
//! - `AiBackend` trait: defines the interface for all AI operations
//! - `AiClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)
//! - `TALLY_AI_TIMEOUT_SECS`: Request timeout for generation calls (default: 30)

pub mod fallback;
mod mock;
mod ollama;
pub mod prompts;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AdviceKind, StatsSnapshot};

/// Trait defining the interface for all AI backends
///
/// Implementations must be Send + Sync to allow use across async tasks.
/// Prompts are built from numeric/categorical aggregates only - user
/// identifiers never cross this boundary.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Generate free-text advice of the given kind from a stats snapshot
    async fn generate_advice(&self, kind: AdviceKind, stats: &StatsSnapshot) -> Result<String>;

    /// Map a transaction description onto one of the fixed categories
    async fn categorize(&self, description: &str) -> Result<String>;

    /// Produce a conversational reply given an assembled context prompt
    async fn chat(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Backend host for display
    fn host(&self) -> &str;

    /// Model name for display
    fn model(&self) -> &str;
}

/// Concrete AI client with compile-time dispatch
///
/// Wraps the available backends in an enum so call sites get a Clone-able
/// value without trait objects.
#[derive(Clone)]
pub enum AiClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AiClient {
    /// Create from environment variables
    ///
    /// Returns None when no backend is configured; the advice endpoints
    /// then serve fallback text exclusively.
    pub fn from_env() -> Option<Self> {
        match std::env::var("AI_BACKEND").as_deref() {
            Ok("mock") => Some(Self::Mock(MockBackend::new())),
            _ => OllamaBackend::from_env().map(Self::Ollama),
        }
    }
}

#[async_trait]
impl AiBackend for AiClient {
    async fn generate_advice(&self, kind: AdviceKind, stats: &StatsSnapshot) -> Result<String> {
        match self {
            Self::Ollama(backend) => backend.generate_advice(kind, stats).await,
            Self::Mock(backend) => backend.generate_advice(kind, stats).await,
        }
    }

    async fn categorize(&self, description: &str) -> Result<String> {
        match self {
            Self::Ollama(backend) => backend.categorize(description).await,
            Self::Mock(backend) => backend.categorize(description).await,
        }
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        match self {
            Self::Ollama(backend) => backend.chat(prompt).await,
            Self::Mock(backend) => backend.chat(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            Self::Ollama(backend) => backend.health_check().await,
            Self::Mock(backend) => backend.health_check().await,
        }
    }

    fn host(&self) -> &str {
        match self {
            Self::Ollama(backend) => backend.host(),
            Self::Mock(backend) => backend.host(),
        }
    }

    fn model(&self) -> &str {
        match self {
            Self::Ollama(backend) => backend.model(),
            Self::Mock(backend) => backend.model(),
        }
    }
}
