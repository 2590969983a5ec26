//! Transaction CRUD handlers
//!
//! Every operation is scoped to the authenticated user; a transaction owned
//! by someone else responds 404, not 403, so ids don't leak.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::{AppError, AppState, AuthUser, SuccessResponse};
use tally_core::models::{NewTransaction, Transaction, UpdateTransaction};

/// GET /api/transactions - The user's transactions, newest created first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    Ok(Json(state.db.list_transactions(user_id)?))
}

/// POST /api/transactions - Record a transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let transaction = state.db.insert_transaction(user_id, &req)?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// PUT /api/transactions/:id - Update fields of a transaction
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTransaction>,
) -> Result<Json<Transaction>, AppError> {
    Ok(Json(state.db.update_transaction(user_id, id, &req)?))
}

/// DELETE /api/transactions/:id - Delete a transaction
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_transaction(user_id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}
