//! Tally Web Server
//!
//! Axum-based REST API for the Tally personal finance application.
//!
//! Security model:
//! - Bearer-token authentication (HS256 access tokens) on every route
//!   except registration/login/refresh
//! - Restrictive CORS policy
//! - Sanitized error responses; internal details stay in the logs
//!
//! The AI advice endpoints never fail on upstream errors - they degrade to
//! locally computed fallback text and keep returning HTTP 200.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use tally_core::ai::{AiBackend, AiClient};
use tally_core::auth::{verify_token, TokenKind};
use tally_core::db::Database;

mod handlers;
mod scheduler;

pub use scheduler::{start_cache_reaper, CacheSweepConfig};

/// Maximum JSON body size (64 KB - nothing here needs more)
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Default time-to-live for cached AI responses, in hours
pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Secret for signing and verifying bearer tokens
    pub jwt_secret: String,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// TTL for cached AI responses
    pub cache_ttl_hours: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            allowed_origins: vec![],
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
        }
    }
}

impl ServerConfig {
    /// Build configuration from environment variables
    ///
    /// `TALLY_JWT_SECRET` is required; `TALLY_ALLOWED_ORIGINS` is a
    /// comma-separated origin list; `TALLY_CACHE_TTL_HOURS` overrides the
    /// 24-hour default.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("TALLY_JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("TALLY_JWT_SECRET must be set"))?;

        let allowed_origins = std::env::var("TALLY_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let cache_ttl_hours = std::env::var("TALLY_CACHE_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_HOURS);

        Ok(Self {
            jwt_secret,
            allowed_origins,
            cache_ttl_hours,
        })
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// AI backend; None means advice endpoints serve fallback text only
    pub ai: Option<AiClient>,
}

/// The verified identity of the requester, inserted by the auth middleware
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

/// Authentication middleware - validates the bearer access token
///
/// Runs before every protected route. A missing or invalid token is
/// rejected with 401 before any aggregation or cache work happens; the
/// verified user id is attached to the request for handlers to consume.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "));

    let user_id = match token {
        Some(token) => match verify_token(token, TokenKind::Access, &state.config.jwt_secret) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, path = %request.uri().path(), "Rejected invalid token");
                return unauthorized_response();
            }
        },
        None => {
            warn!(path = %request.uri().path(), "Unauthorized request - no bearer token");
            return unauthorized_response();
        }
    };

    request.extensions_mut().insert(AuthUser(user_id));
    next.run(request).await
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    create_router_with_ai(db, config, AiClient::from_env())
}

/// Create the application router with an explicit AI client (for testing)
pub fn create_router_with_ai(db: Database, config: ServerConfig, ai: Option<AiClient>) -> Router {
    if let Some(ref client) = ai {
        info!(
            "AI backend configured: {} (model: {})",
            client.host(),
            client.model()
        );
    } else {
        info!("ℹ️  AI backend not configured (set OLLAMA_HOST to enable AI features)");
    }

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        ai,
    });

    // Routes reachable without a token
    let public_routes = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh));

    // Everything else requires a verified identity
    let protected_routes = Router::new()
        // Auth
        .route("/me", get(handlers::get_me))
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transactions/:id",
            axum::routing::put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        // Dashboard
        .route("/dashboard", get(handlers::get_dashboard))
        // AI advice (cached on the stats fingerprint)
        .route("/ai/summary", post(handlers::ai_summary))
        .route("/ai/insights", post(handlers::ai_insights))
        .route("/ai/budget", post(handlers::ai_budget))
        .route("/ai/monthly-summary", post(handlers::ai_monthly_summary))
        .route("/ai/anomaly", post(handlers::ai_anomaly))
        .route("/ai/categorize", post(handlers::ai_categorize))
        // Chat
        .route("/ai/chat", post(handlers::ai_chat))
        .route("/ai/history", get(handlers::chat_history))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = public_routes.merge(protected_routes);

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    // Check AI backend connection
    check_ai_connection().await;

    // Start the cache reaper if configured
    if let Some(sweep_config) = CacheSweepConfig::from_env() {
        start_cache_reaper(db.clone(), sweep_config);
    }

    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection() {
    match AiClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured (set OLLAMA_HOST to enable AI features)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<tally_core::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<tally_core::Error> for AppError {
    fn from(err: tally_core::Error) -> Self {
        use tally_core::Error;
        match err {
            Error::Auth(_) => Self {
                status: StatusCode::UNAUTHORIZED,
                message: "Authentication required".to_string(),
                internal: Some(err),
            },
            Error::NotFound(ref what) => Self {
                status: StatusCode::NOT_FOUND,
                message: format!("{} not found", what),
                internal: None,
            },
            Error::InvalidData(ref msg) => Self {
                status: StatusCode::BAD_REQUEST,
                message: msg.clone(),
                internal: None,
            },
            // Persistence and upstream failures: generic message to the
            // client, full detail in the logs
            _ => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "An internal error occurred".to_string(),
                internal: Some(err),
            },
        }
    }
}

#[cfg(test)]
mod tests;
