//! Authentication handlers: register, login, refresh, me

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, AuthUser};
use tally_core::auth::{hash_password, sign_token, verify_password, verify_token, TokenKind};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair issued on register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub access_token: String,
    pub refresh_token: String,
}

/// POST /api/auth/register - Create an account and issue tokens
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::bad_request("Email and password are required"));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state
        .db
        .create_user(req.name.trim(), req.email.trim(), &password_hash)?;

    let response = issue_tokens(user.id, &state.config.jwt_secret)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login - Verify credentials and issue tokens
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .db
        .get_user_by_email(req.email.trim())?
        .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    Ok(Json(issue_tokens(user.id, &state.config.jwt_secret)?))
}

/// POST /api/auth/refresh - Exchange a refresh token for a new access token
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = verify_token(
        &req.refresh_token,
        TokenKind::Refresh,
        &state.config.jwt_secret,
    )?;

    let access_token = sign_token(user_id, TokenKind::Access, &state.config.jwt_secret)?;
    Ok(Json(serde_json::json!({ "access_token": access_token })))
}

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// GET /api/me - The currently authenticated user
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<MeResponse>, AppError> {
    let user = state.db.get_user(user_id)?;
    Ok(Json(MeResponse {
        id: user.id,
        name: user.name,
        email: user.email,
    }))
}

fn issue_tokens(user_id: i64, secret: &str) -> Result<AuthResponse, tally_core::Error> {
    Ok(AuthResponse {
        success: true,
        access_token: sign_token(user_id, TokenKind::Access, secret)?,
        refresh_token: sign_token(user_id, TokenKind::Refresh, secret)?,
    })
}
