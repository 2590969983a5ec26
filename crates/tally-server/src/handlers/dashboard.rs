//! Dashboard handler

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};

use crate::{AppError, AppState, AuthUser};
use tally_core::models::StatsSnapshot;

/// GET /api/dashboard - Full stats snapshot for the authenticated user
///
/// Recomputed on every request. A persistence failure here surfaces as a
/// 500 - stats cannot be substituted with fallback data.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<StatsSnapshot>, AppError> {
    let today = chrono::Local::now().date_naive();
    let snapshot = state.db.compute_snapshot(user_id, today)?;
    Ok(Json(snapshot))
}
