//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{admin_page, body_json};

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with expected JSON fields
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let app = common::build_test_app();
    let response = app.get("/health", &[]).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["manifest_directives"], 8);
    assert_eq!(json["pending_sessions"], 0);
}

// ---------------------------------------------------------------------------
// Test: pending sessions are counted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_counts_pending_sessions() {
    let app = common::build_test_app();
    app.render_new_session(admin_page("index.php")).await;

    let json = body_json(app.get("/health", &[]).await).await;
    assert_eq!(json["pending_sessions"], 1);
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app();
    let response = app.get("/this-route-does-not-exist", &[]).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = common::build_test_app();
    let response = app.get("/health", &[]).await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header");
    assert!(!request_id.is_empty());
}

// ---------------------------------------------------------------------------
// Test: a provided x-request-id is propagated unchanged
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provided_request_id_is_propagated() {
    let app = common::build_test_app();
    let response = app
        .get("/health", &[("x-request-id", "my-request-42")])
        .await;

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "my-request-42"
    );
}

// ---------------------------------------------------------------------------
// Test: malformed page context is rejected before selection runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_page_context_is_rejected() {
    let app = common::build_test_app();
    let response = app
        .render(serde_json::json!({ "is_admin_area": "yes" }), None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.state.sessions.len().await, 0);

    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["error"].as_str().unwrap().contains("is_admin_area"));
}
