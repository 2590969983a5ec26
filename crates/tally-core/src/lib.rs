//! Tally Core Library
//!
//! Shared functionality for the Tally personal finance tracker:
//! - Database access and migrations
//! - Owner-scoped transaction CRUD
//! - Dashboard stats aggregation (monthly totals, category breakdown, trend)
//! - Stats fingerprinting for AI cache invalidation
//! - TTL-bounded AI response cache
//! - Pluggable AI backend (Ollama, mock) with deterministic fallbacks
//! - Spending anomaly detection
//! - Password hashing and bearer tokens

pub mod ai;
pub mod auth;
pub mod db;
pub mod detect;
pub mod error;
pub mod fingerprint;
pub mod models;

pub use ai::{AiBackend, AiClient, MockBackend, OllamaBackend};
pub use db::Database;
pub use detect::{detect_anomalies, DetectionConfig};
pub use error::{Error, Result};
pub use fingerprint::{cache_key, stats_fingerprint};
