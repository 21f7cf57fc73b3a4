//! Health check tests.

use super::common::{
    get, plugin_context, post_json, resource, test_app, MockResponse, MockUpstream,
};
use axum::http::StatusCode;
use serde_json::json;

const HEALTH_PATH: &str = "/api/v1/health";

#[tokio::test]
async fn test_liveness_endpoint() {
    let (app, _) = test_app();

    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "mirador-connector");
    assert!(body["version"].is_string());
    assert_eq!(body["schemas"]["logs"], json!({"cached": false, "overrides": 0}));
}

#[tokio::test]
async fn test_liveness_reflects_schema_store() {
    let upstream = MockUpstream::start(vec![(
        "/api/v1/schema/metrics",
        MockResponse::json(json!({"metrics": [{"name": "up", "type": "gauge"}]})),
    )])
    .await;
    let (app, _) = test_app();
    let url = upstream.url();

    resource(app.clone(), &url, "GET", "schema/metrics", json!(null)).await;
    resource(
        app.clone(),
        &url,
        "POST",
        "schema/traces/payments",
        json!({"name": "payments"}),
    )
    .await;

    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schemas"]["metrics"], json!({"cached": true, "overrides": 0}));
    assert_eq!(body["schemas"]["traces"], json!({"cached": false, "overrides": 1}));
    assert_eq!(upstream.total_calls(), 1);
}

#[tokio::test]
async fn test_healthy_instance() {
    let upstream =
        MockUpstream::start(vec![(HEALTH_PATH, MockResponse::json(json!({"status": "ok"})))]).await;
    let (app, _) = test_app();

    let (status, body) = post_json(
        app,
        "/api/v1/plugin/health",
        json!({"pluginContext": plugin_context(&upstream.url())}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Mirador Core configuration looks good");

    let sent = upstream.last_request(HEALTH_PATH).unwrap();
    assert_eq!(sent.method, "GET");
    assert_eq!(sent.headers["authorization"], "Bearer secret-token");
}

#[tokio::test]
async fn test_failing_instance_reports_status() {
    let upstream = MockUpstream::start(vec![(
        HEALTH_PATH,
        MockResponse::status(StatusCode::INTERNAL_SERVER_ERROR),
    )])
    .await;
    let (app, _) = test_app();

    let (status, body) = post_json(
        app,
        "/api/v1/plugin/health",
        json!({"pluginContext": plugin_context(&upstream.url())}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "mirador health check failed: 500 Internal Server Error"
    );
}

#[tokio::test]
async fn test_unreadable_settings() {
    let (app, _) = test_app();

    let (status, body) = post_json(
        app,
        "/api/v1/plugin/health",
        json!({"pluginContext": {"instanceSettings": {"jsonData": {"timeoutMs": "soon"}}}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Unable to load settings");
}
