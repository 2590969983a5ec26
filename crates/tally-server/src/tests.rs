//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tally_core::ai::MockBackend;
use tally_core::auth::{hash_password, sign_token, TokenKind};
use tally_core::db::Database;
use tally_core::models::{NewTransaction, TxKind};

const SECRET: &str = "test-secret";

fn test_config() -> ServerConfig {
    ServerConfig {
        jwt_secret: SECRET.to_string(),
        ..Default::default()
    }
}

/// Router + db + an existing user with a valid access token
fn setup_test_app(ai: Option<AiClient>) -> (Router, Database, i64, String) {
    let db = Database::in_memory().unwrap();
    let user = db.create_user("Test User", "test@example.com", "hash").unwrap();
    let token = sign_token(user.id, TokenKind::Access, SECRET).unwrap();
    let app = create_router_with_ai(db.clone(), test_config(), ai);
    (app, db, user.id, token)
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn seed_tx(db: &Database, user: i64, amount: f64, kind: TxKind, category: &str) {
    db.insert_transaction(
        user,
        &NewTransaction {
            amount,
            kind,
            category: category.to_string(),
            description: None,
            date: today(),
        },
    )
    .unwrap();
}

// ========== Auth ==========

#[tokio::test]
async fn test_register_login_me_flow() {
    let db = Database::in_memory().unwrap();
    let app = create_router_with_ai(db, test_config(), None);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/register",
            "",
            serde_json::json!({
                "name": "Alice",
                "email": "alice@example.com",
                "password": "hunter2-hunter2"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json["access_token"].as_str().is_some());

    // Log in with the same credentials
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            "",
            serde_json::json!({
                "email": "alice@example.com",
                "password": "hunter2-hunter2"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let token = json["access_token"].as_str().unwrap().to_string();

    // Use the access token
    let response = app
        .oneshot(get("/api/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["name"], "Alice");
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let db = Database::in_memory().unwrap();
    db.create_user("Alice", "alice@example.com", &hash_password("correct").unwrap())
        .unwrap();
    let app = create_router_with_ai(db, test_config(), None);

    let response = app
        .oneshot(post_json(
            "/api/auth/login",
            "",
            serde_json::json!({"email": "alice@example.com", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_issues_usable_access_token() {
    let db = Database::in_memory().unwrap();
    let user = db.create_user("Alice", "alice@example.com", "hash").unwrap();
    let refresh = sign_token(user.id, TokenKind::Refresh, SECRET).unwrap();
    let app = create_router_with_ai(db, test_config(), None);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/refresh",
            "",
            serde_json::json!({ "refresh_token": refresh }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let access = json["access_token"].as_str().unwrap();

    let response = app.oneshot(get("/api/me", access)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let (app, _db, user, _token) = setup_test_app(None);
    let refresh = sign_token(user, TokenKind::Refresh, SECRET).unwrap();

    let response = app.oneshot(get("/api/me", &refresh)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ========== Authorization boundary (scenario C) ==========

#[tokio::test]
async fn test_unauthenticated_requests_rejected() {
    let (app, db, _user, _token) = setup_test_app(None);

    for uri in [
        "/api/me",
        "/api/transactions",
        "/api/dashboard",
        "/api/ai/history",
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }

    for uri in [
        "/api/ai/summary",
        "/api/ai/insights",
        "/api/ai/budget",
        "/api/ai/monthly-summary",
        "/api/ai/anomaly",
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("authorization", "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }

    // Rejected requests never touched the cache
    assert_eq!(db.count_cache_entries().unwrap(), 0);
}

// ========== Transactions ==========

#[tokio::test]
async fn test_transaction_crud() {
    let (app, _db, _user, token) = setup_test_app(None);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/transactions",
            &token,
            serde_json::json!({
                "amount": 42.5,
                "kind": "expense",
                "category": "Food",
                "description": "lunch",
                "date": today().to_string()
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = get_body_json(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["amount"], 42.5);
    assert_eq!(created["kind"], "expense");

    // Update
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/transactions/{}", id))
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"amount": 50.0}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = get_body_json(response).await;
    assert_eq!(updated["amount"], 50.0);
    assert_eq!(updated["category"], "Food");

    // List
    let response = app
        .clone()
        .oneshot(get("/api/transactions", &token))
        .await
        .unwrap();
    let list = get_body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Delete
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/transactions/{}", id))
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/api/transactions", &token))
        .await
        .unwrap();
    let list = get_body_json(response).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_transaction_validation() {
    let (app, _db, _user, token) = setup_test_app(None);

    let response = app
        .oneshot(post_json(
            "/api/transactions",
            &token,
            serde_json::json!({
                "amount": -5.0,
                "kind": "expense",
                "category": "Food",
                "date": today().to_string()
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transactions_are_owner_scoped() {
    let (app, db, _alice, _alice_token) = setup_test_app(None);
    let bob = db.create_user("Bob", "bob@example.com", "hash").unwrap();
    let bob_token = sign_token(bob.id, TokenKind::Access, SECRET).unwrap();

    seed_tx(&db, _alice, 10.0, TxKind::Expense, "Food");
    let alice_tx_id = db.list_transactions(_alice).unwrap()[0].id;

    // Bob cannot see or delete Alice's transaction
    let response = app
        .clone()
        .oneshot(get("/api/transactions", &bob_token))
        .await
        .unwrap();
    assert!(get_body_json(response).await.as_array().unwrap().is_empty());

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/transactions/{}", alice_tx_id))
                .header("authorization", format!("Bearer {}", bob_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Dashboard (scenario A) ==========

#[tokio::test]
async fn test_dashboard_aggregates() {
    let (app, db, user, token) = setup_test_app(None);
    seed_tx(&db, user, 100.0, TxKind::Expense, "Food");
    seed_tx(&db, user, 1000.0, TxKind::Income, "Salary");

    let response = app.oneshot(get("/api/dashboard", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["income"], 1000.0);
    assert_eq!(json["expense"], 100.0);
    assert_eq!(json["savings"], 900.0);
    assert_eq!(json["category_breakdown"][0]["name"], "Food");
    assert_eq!(json["category_breakdown"][0]["value"], 100.0);
    assert_eq!(json["month_comparison"]["this_month"], 100.0);
    // No expenses last month: no percentage, not infinity
    assert!(json["month_comparison"]["percent_change"].is_null());
    assert_eq!(json["recent"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_dashboard_empty_user() {
    let (app, _db, _user, token) = setup_test_app(None);

    let response = app.oneshot(get("/api/dashboard", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["income"], 0.0);
    assert_eq!(json["savings"], 0.0);
    assert!(json["category_breakdown"].as_array().unwrap().is_empty());
}

// ========== AI advice ==========

#[tokio::test]
async fn test_ai_summary_fallback_when_backend_down() {
    // Scenario B: the backend times out / fails, the endpoint still answers
    let mock = MockBackend::unhealthy();
    let (app, db, user, token) =
        setup_test_app(Some(AiClient::Mock(mock.clone())));
    seed_tx(&db, user, 100.0, TxKind::Expense, "Food");
    seed_tx(&db, user, 1000.0, TxKind::Income, "Salary");

    let response = app
        .oneshot(post_json("/api/ai/summary", &token, serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let summary = json["summary"].as_str().unwrap();
    assert!(!summary.is_empty());
    // Fallback text carries the computed savings figure
    assert!(summary.contains("900"), "summary was: {}", summary);

    // The backend was attempted once; its failure was not cached
    assert_eq!(mock.call_count(), 1);
    assert_eq!(db.count_cache_entries().unwrap(), 0);
}

#[tokio::test]
async fn test_ai_summary_is_cached_on_fingerprint() {
    let mock = MockBackend::new();
    let (app, db, user, token) =
        setup_test_app(Some(AiClient::Mock(mock.clone())));
    seed_tx(&db, user, 100.0, TxKind::Expense, "Food");

    let first = app
        .clone()
        .oneshot(post_json("/api/ai/summary", &token, serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = get_body_json(first).await;

    let second = app
        .clone()
        .oneshot(post_json("/api/ai/summary", &token, serde_json::json!({})))
        .await
        .unwrap();
    let second = get_body_json(second).await;

    // Same stats, same fingerprint: one backend call, identical text
    assert_eq!(mock.call_count(), 1);
    assert_eq!(first["summary"], second["summary"]);
    assert_eq!(db.count_cache_entries().unwrap(), 1);

    // A new transaction changes the fingerprint and misses the cache
    seed_tx(&db, user, 50.0, TxKind::Expense, "Travel");
    let third = app
        .oneshot(post_json("/api/ai/summary", &token, serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(third.status(), StatusCode::OK);
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn test_advice_kinds_are_cached_separately() {
    let mock = MockBackend::new();
    let (app, db, user, token) =
        setup_test_app(Some(AiClient::Mock(mock.clone())));
    seed_tx(&db, user, 100.0, TxKind::Expense, "Food");

    for uri in ["/api/ai/summary", "/api/ai/insights", "/api/ai/budget"] {
        let response = app
            .clone()
            .oneshot(post_json(uri, &token, serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }

    assert_eq!(mock.call_count(), 3);
    assert_eq!(db.count_cache_entries().unwrap(), 3);
}

#[tokio::test]
async fn test_advice_endpoints_without_backend() {
    let (app, db, user, token) = setup_test_app(None);
    seed_tx(&db, user, 200.0, TxKind::Expense, "Travel");

    for (uri, field) in [
        ("/api/ai/summary", "summary"),
        ("/api/ai/insights", "insights"),
        ("/api/ai/budget", "budget"),
        ("/api/ai/monthly-summary", "summary"),
    ] {
        let response = app
            .clone()
            .oneshot(post_json(uri, &token, serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        let json = get_body_json(response).await;
        let text = json[field].as_str().unwrap();
        assert!(!text.is_empty(), "{} returned empty {}", uri, field);
    }
}

#[tokio::test]
async fn test_anomaly_detection_endpoint() {
    let (app, db, user, token) = setup_test_app(None);

    // Empty history: empty list, not an error
    let response = app
        .clone()
        .oneshot(post_json("/api/ai/anomaly", &token, serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json["anomalies"].as_array().unwrap().is_empty());

    // Three quiet days and one spike
    let base = today();
    for (offset, amount) in [(3, 10.0), (2, 10.0), (1, 10.0), (0, 200.0)] {
        db.insert_transaction(
            user,
            &NewTransaction {
                amount,
                kind: TxKind::Expense,
                category: "Food".to_string(),
                description: None,
                date: base - chrono::Duration::days(offset),
            },
        )
        .unwrap();
    }

    let response = app
        .oneshot(post_json("/api/ai/anomaly", &token, serde_json::json!({})))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let anomalies = json["anomalies"].as_array().unwrap();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0]["amount"], 200.0);
}

#[tokio::test]
async fn test_categorize_endpoint() {
    let (app, _db, _user, token) = setup_test_app(None);

    // Keyword fallback when no backend is configured
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/ai/categorize",
            &token,
            serde_json::json!({"description": "coffee at the corner cafe"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Food");

    // Empty description is a client error
    let response = app
        .oneshot(post_json(
            "/api/ai/categorize",
            &token,
            serde_json::json!({"description": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Chat ==========

#[tokio::test]
async fn test_chat_round_trip_and_history() {
    let mock = MockBackend::new();
    let (app, db, user, token) =
        setup_test_app(Some(AiClient::Mock(mock.clone())));
    seed_tx(&db, user, 100.0, TxKind::Expense, "Food");

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/ai/chat",
            &token,
            serde_json::json!({
                "messages": [{"role": "user", "content": "How am I doing this month?"}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(!json["reply"].as_str().unwrap().is_empty());

    // Both turns were persisted, oldest first
    let response = app
        .oneshot(get("/api/ai/history", &token))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "How am I doing this month?");
    assert_eq!(messages[1]["role"], "assistant");
}

#[tokio::test]
async fn test_chat_survives_backend_failure() {
    let (app, _db, _user, token) =
        setup_test_app(Some(AiClient::Mock(MockBackend::unhealthy())));

    let response = app
        .oneshot(post_json(
            "/api/ai/chat",
            &token,
            serde_json::json!({
                "messages": [{"role": "user", "content": "hello"}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(!json["reply"].as_str().unwrap().is_empty());
}
