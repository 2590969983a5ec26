//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod advice;
pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod transactions;

// Re-export all handlers for use in router
pub use advice::*;
pub use auth::*;
pub use chat::*;
pub use dashboard::*;
pub use transactions::*;
