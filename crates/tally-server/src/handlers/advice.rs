//! AI advice handlers - the cacheable core
//!
//! Every advice endpoint follows the same path: recompute the stats
//! snapshot server-side, fingerprint it, consult the response cache, and
//! only on a miss call the AI backend. Upstream failures degrade to
//! deterministic fallback text; cache failures never block the response.
//!
//! Fingerprints are always taken over the server-recomputed snapshot.
//! Client-supplied stats are deliberately not accepted - a forged payload
//! could otherwise poison another request's cache slot.

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Duration;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{AppError, AppState, AuthUser};
use tally_core::ai::{fallback, AiBackend};
use tally_core::detect::{detect_anomalies, DetectionConfig};
use tally_core::fingerprint::stats_fingerprint;
use tally_core::models::AdviceKind;

/// Outcome of the best-effort cache write for one advice response
///
/// The text is returned to the caller regardless; this only records whether
/// it was also persisted, so tests and logs can tell the difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    /// Served straight from the cache
    Hit,
    /// Fresh AI output, stored
    Stored,
    /// Fallback text; fallbacks are not cached so the backend can recover
    Skipped,
    /// Fresh AI output, but the write failed (logged and ignored)
    Failed,
}

/// Run the full advise flow for one kind
pub(crate) async fn cached_advice(
    state: &AppState,
    user_id: i64,
    kind: AdviceKind,
) -> Result<(String, CacheWrite), AppError> {
    let today = chrono::Local::now().date_naive();

    // Aggregation failure is fatal - stats cannot be faked
    let snapshot = state.db.compute_snapshot(user_id, today)?;
    let hash = stats_fingerprint(&snapshot);
    let now = chrono::Utc::now();

    // A cache read error is just a miss
    match state
        .db
        .get_cached_response(user_id, kind.as_str(), &hash, now)
    {
        Ok(Some(text)) => {
            debug!(kind = %kind, "Serving cached AI response");
            return Ok((text, CacheWrite::Hit));
        }
        Ok(None) => {}
        Err(e) => warn!(kind = %kind, error = %e, "Cache read failed, regenerating"),
    }

    let generated = match &state.ai {
        Some(client) => match client.generate_advice(kind, &snapshot).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(kind = %kind, error = %e, "AI generation failed, using fallback");
                None
            }
        },
        None => None,
    };

    let result = match generated {
        Some(text) => {
            let write = match state.db.save_cached_response(
                user_id,
                kind.as_str(),
                &hash,
                &text,
                Duration::hours(state.config.cache_ttl_hours),
                now,
            ) {
                Ok(()) => CacheWrite::Stored,
                Err(e) => {
                    // Best-effort: the answer still goes out
                    warn!(kind = %kind, error = %e, "Cache write failed");
                    CacheWrite::Failed
                }
            };
            (text, write)
        }
        None => (fallback::fallback_advice(kind, &snapshot), CacheWrite::Skipped),
    };

    Ok(result)
}

async fn advice_response(
    state: &AppState,
    user_id: i64,
    kind: AdviceKind,
) -> Result<Json<serde_json::Value>, AppError> {
    let (text, _write) = cached_advice(state, user_id, kind).await?;
    Ok(Json(serde_json::json!({ (kind.response_field()): text })))
}

/// POST /api/ai/summary - Short monthly summary
pub async fn ai_summary(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    advice_response(&state, user_id, AdviceKind::Summary).await
}

/// POST /api/ai/insights - Monthly insight report
pub async fn ai_insights(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    advice_response(&state, user_id, AdviceKind::Insights).await
}

/// POST /api/ai/budget - Budget suggestion for next month
pub async fn ai_budget(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    advice_response(&state, user_id, AdviceKind::Budget).await
}

/// POST /api/ai/monthly-summary - Three-bullet spending recap
pub async fn ai_monthly_summary(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    advice_response(&state, user_id, AdviceKind::MonthlySummary).await
}

/// POST /api/ai/anomaly - Unusually high spending days
///
/// Deterministic local detection; nothing here needs the AI backend or the
/// cache, and an empty history is an empty list, not an error.
pub async fn ai_anomaly(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let daily = state.db.daily_expense_totals(user_id)?;
    let anomalies = detect_anomalies(&daily, &DetectionConfig::default());
    Ok(Json(serde_json::json!({ "anomalies": anomalies })))
}

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    pub description: String,
}

/// POST /api/ai/categorize - Map a description onto a category
pub async fn ai_categorize(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(_user_id)): Extension<AuthUser>,
    Json(req): Json<CategorizeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.description.trim().is_empty() {
        return Err(AppError::bad_request("No description provided"));
    }

    let category = match &state.ai {
        Some(client) => match client.categorize(&req.description).await {
            Ok(category) => category,
            Err(e) => {
                warn!(error = %e, "AI categorization failed, using keyword fallback");
                fallback::fallback_category(&req.description)
            }
        },
        None => fallback::fallback_category(&req.description),
    };

    Ok(Json(serde_json::json!({ "category": category })))
}
