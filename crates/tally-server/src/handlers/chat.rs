//! Finance chat handlers
//!
//! The chat assembles the user's aggregates, recent transactions, and prior
//! conversation into one prompt. Turns are persisted append-only; the
//! default session is the user's own id, matching a single ongoing
//! conversation per user.

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{AppError, AppState, AuthUser};
use tally_core::ai::{fallback, prompts, AiBackend};
use tally_core::models::ChatRole;

/// Maximum history turns replayed into the prompt
const HISTORY_PROMPT_LIMIT: i64 = 50;

/// Maximum messages returned by the history endpoint
const HISTORY_FETCH_LIMIT: i64 = 200;

/// Recent transactions listed in the prompt
const RECENT_TX_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct IncomingChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<IncomingChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryMessage {
    pub role: String,
    pub content: String,
}

/// POST /api/ai/chat - One conversational turn
pub async fn ai_chat(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_input = req
        .messages
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default();

    let session_id = user_id.to_string();
    state
        .db
        .append_chat_message(user_id, &session_id, ChatRole::User, &user_input)?;

    // Assemble financial context
    let today = chrono::Local::now().date_naive();
    let snapshot = state.db.compute_snapshot(user_id, today)?;

    let recent_text = state
        .db
        .list_transactions(user_id)?
        .into_iter()
        .take(RECENT_TX_LIMIT)
        .map(|t| {
            format!(
                "{} - {} - {} - ${} - {}",
                t.date,
                t.kind,
                t.category,
                t.amount,
                t.description.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let history_text = state
        .db
        .list_chat_messages(user_id, HISTORY_PROMPT_LIMIT)?
        .into_iter()
        .map(|m| {
            let speaker = match m.role {
                ChatRole::User => "User",
                ChatRole::Assistant => "Assistant",
            };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = prompts::chat_prompt(&snapshot, &recent_text, &history_text);

    let reply = match &state.ai {
        Some(client) => match client.chat(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "AI chat failed, using canned reply");
                fallback::fallback_chat_reply()
            }
        },
        None => fallback::fallback_chat_reply(),
    };

    state
        .db
        .append_chat_message(user_id, &session_id, ChatRole::Assistant, &reply)?;

    Ok(Json(serde_json::json!({ "reply": reply })))
}

/// GET /api/ai/history - Conversation so far, oldest first
pub async fn chat_history(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let messages: Vec<ChatHistoryMessage> = state
        .db
        .list_chat_messages(user_id, HISTORY_FETCH_LIMIT)?
        .into_iter()
        .map(|m| ChatHistoryMessage {
            role: m.role.as_str().to_string(),
            content: m.content,
        })
        .collect();

    Ok(Json(serde_json::json!({ "messages": messages })))
}
