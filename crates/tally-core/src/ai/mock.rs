//! Mock backend for testing
//!
//! Provides predictable responses for all AI operations, plus a call counter
//! so tests can assert the response cache actually short-circuits repeat
//! generation. The unhealthy variant fails every call, which exercises the
//! fallback paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{AdviceKind, StatsSnapshot};

use super::AiBackend;

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether calls should succeed
    pub healthy: bool,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock backend whose every call fails
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many generation calls have been attempted
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.healthy {
            Ok(())
        } else {
            Err(Error::Upstream("Mock backend is down".to_string()))
        }
    }
}

#[async_trait]
impl AiBackend for MockBackend {
    async fn generate_advice(&self, kind: AdviceKind, stats: &StatsSnapshot) -> Result<String> {
        self.record_call()?;
        Ok(format!(
            "[mock {}] income {} expense {} savings {}",
            kind, stats.income, stats.expense, stats.savings
        ))
    }

    async fn categorize(&self, description: &str) -> Result<String> {
        self.record_call()?;
        let lower = description.to_lowercase();
        let category = if lower.contains("coffee") || lower.contains("restaurant") {
            "Food"
        } else if lower.contains("uber") || lower.contains("flight") {
            "Travel"
        } else if lower.contains("netflix") || lower.contains("spotify") {
            "Entertainment"
        } else if lower.contains("salary") {
            "Salary"
        } else {
            "Other"
        };
        Ok(category.to_string())
    }

    async fn chat(&self, _prompt: &str) -> Result<String> {
        self.record_call()?;
        Ok("[mock] Based on your data, things look steady this month.".to_string())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn host(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock"
    }
}
