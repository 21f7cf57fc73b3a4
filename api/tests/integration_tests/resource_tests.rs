//! Schema resource API tests.

use super::common::{resource, test_app, MockResponse, MockUpstream};
use api::plugin::ResourceRequest;
use api::Datasource;
use axum::http::StatusCode;
use serde_json::json;
use shared::config::InstanceSettings;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const LOG_FIELDS: &str = "/api/v1/schema/logs/fields";
const METRICS: &str = "/api/v1/schema/metrics";
const SERVICES: &str = "/api/v1/schema/traces/services";

fn log_fields() -> MockResponse {
    MockResponse::json(json!({
        "fields": [
            {"name": "level", "type": "string"},
            {"name": "service", "type": "string"}
        ],
        "version": "1"
    }))
}

#[tokio::test]
async fn test_list_is_cached() {
    let upstream = MockUpstream::start(vec![(LOG_FIELDS, log_fields())]).await;
    let (app, _) = test_app();

    let (status, first) = resource(app.clone(), &upstream.url(), "GET", "schema/logs", json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["fields"][0]["name"], "level");
    assert_eq!(first["version"], "1");

    let (status, second) = resource(app, &upstream.url(), "", "/schema/logs/", json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, first);
    assert_eq!(upstream.calls(LOG_FIELDS), 1);
}

#[tokio::test]
async fn test_override_merges_into_list() {
    let upstream = MockUpstream::start(vec![(LOG_FIELDS, log_fields())]).await;
    let (app, state) = test_app();
    let url = upstream.url();

    resource(app.clone(), &url, "GET", "schema/logs", json!(null)).await;

    let (status, saved) = resource(
        app.clone(),
        &url,
        "POST",
        "schema/logs/level",
        json!({"name": "level", "type": "string", "description": "Severity"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["description"], "Severity");
    assert!(!state.datasource().cache().logs.is_fresh());

    resource(
        app.clone(),
        &url,
        "PUT",
        "schema/logs",
        json!({"name": "trace_id", "type": "string"}),
    )
    .await;

    let (status, list) = resource(app.clone(), &url, "GET", "schema/logs", json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upstream.calls(LOG_FIELDS), 2);

    let names: Vec<&str> = list["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|field| field["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["level", "service", "trace_id"]);
    assert_eq!(list["fields"][0]["description"], "Severity");

    let (status, cached) = resource(app, &url, "GET", "schema/logs", json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cached, list);
    assert_eq!(upstream.calls(LOG_FIELDS), 2);
}

#[tokio::test]
async fn test_save_invalidates_only_its_kind() {
    let upstream = MockUpstream::start(vec![
        (LOG_FIELDS, log_fields()),
        (
            METRICS,
            MockResponse::json(json!({"metrics": [{"name": "up", "type": "gauge"}]})),
        ),
        (
            SERVICES,
            MockResponse::json(json!({"services": [{"name": "payments"}]})),
        ),
    ])
    .await;
    let (app, _) = test_app();
    let url = upstream.url();

    for path in ["schema/logs", "schema/metrics", "schema/traces"] {
        resource(app.clone(), &url, "GET", path, json!(null)).await;
    }

    let (status, _) = resource(
        app.clone(),
        &url,
        "PUT",
        "schema/metrics/up",
        json!({"name": "up", "type": "gauge", "unit": "bool"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, metrics) = resource(app.clone(), &url, "GET", "schema/metrics", json!(null)).await;
    assert_eq!(metrics["metrics"][0]["unit"], "bool");
    assert_eq!(upstream.calls(METRICS), 2);
    assert_eq!(upstream.calls(SERVICES), 1);

    let (status, _) = resource(
        app.clone(),
        &url,
        "POST",
        "schema/traces",
        json!({"name": "checkout", "description": "Checkout flow"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, traces) = resource(app.clone(), &url, "GET", "schema/traces", json!(null)).await;
    let services: Vec<&str> = traces["services"]
        .as_array()
        .unwrap()
        .iter()
        .map(|service| service["name"].as_str().unwrap())
        .collect();
    assert_eq!(services, vec!["payments", "checkout"]);
    assert_eq!(upstream.calls(SERVICES), 2);

    for path in ["schema/logs", "schema/metrics", "schema/traces"] {
        resource(app.clone(), &url, "GET", path, json!(null)).await;
    }
    assert_eq!(upstream.calls(LOG_FIELDS), 1);
    assert_eq!(upstream.calls(METRICS), 2);
    assert_eq!(upstream.calls(SERVICES), 2);
}

#[tokio::test]
async fn test_null_upstream_list_is_empty_document() {
    let upstream = MockUpstream::start(vec![(
        LOG_FIELDS,
        MockResponse::json(json!({"fields": null, "version": "3"})),
    )])
    .await;
    let (app, _) = test_app();

    let (status, body) = resource(app, &upstream.url(), "GET", "schema/logs", json!(null)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fields"], json!([]));
    assert_eq!(body["version"], "3");
}

#[tokio::test]
async fn test_saved_entity_is_served_without_upstream() {
    let upstream = MockUpstream::start(vec![]).await;
    let (app, _) = test_app();
    let url = upstream.url();

    let descriptor = json!({
        "name": "http_requests_total",
        "type": "counter",
        "unit": "requests",
        "labels": ["service", "code"]
    });

    let (status, _) = resource(
        app.clone(),
        &url,
        "POST",
        "schema/metrics/http_requests_total",
        descriptor.clone(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = resource(
        app,
        &url,
        "GET",
        "schema/metrics/http_requests_total",
        json!(null),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, descriptor);
    assert_eq!(upstream.total_calls(), 0);
}

#[tokio::test]
async fn test_entity_falls_back_to_upstream() {
    let upstream = MockUpstream::start(vec![(
        "/api/v1/schema/logs/fields/k8s%2Fpod",
        MockResponse::json(json!({"name": "k8s/pod", "type": "string"})),
    )])
    .await;
    let (app, _) = test_app();

    let (status, body) = resource(app, &upstream.url(), "GET", "schema/logs/k8s/pod", json!(null)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "k8s/pod");
    assert_eq!(upstream.calls("/api/v1/schema/logs/fields/k8s%2Fpod"), 1);
}

#[tokio::test]
async fn test_upstream_error_is_bad_gateway() {
    let upstream = MockUpstream::start(vec![(
        SERVICES,
        MockResponse::status(StatusCode::INTERNAL_SERVER_ERROR),
    )])
    .await;
    let (app, state) = test_app();

    let (status, body) = resource(app, &upstream.url(), "GET", "schema/traces", json!(null)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "mirador request failed: 500 Internal Server Error");
    assert!(!state.datasource().cache().traces.is_fresh());
}

#[tokio::test]
async fn test_rejected_writes() {
    let upstream = MockUpstream::start(vec![]).await;
    let (app, state) = test_app();
    let url = upstream.url();

    let cases = [
        (
            "POST",
            "schema/metrics/up",
            json!({"name": "down", "type": "gauge"}),
            StatusCode::BAD_REQUEST,
            "payload name must match resource path",
        ),
        (
            "POST",
            "schema/metrics",
            json!({"name": "up"}),
            StatusCode::BAD_REQUEST,
            "name and type are required",
        ),
        (
            "PUT",
            "schema/traces",
            json!(null),
            StatusCode::BAD_REQUEST,
            "request body is required",
        ),
        (
            "DELETE",
            "schema/logs/level",
            json!(null),
            StatusCode::METHOD_NOT_ALLOWED,
            "unsupported method",
        ),
        (
            "GET",
            "schema/events",
            json!(null),
            StatusCode::NOT_FOUND,
            "resource not found",
        ),
    ];

    for (method, path, body, expected_status, expected_error) in cases {
        let (status, response) = resource(app.clone(), &url, method, path, body).await;
        assert_eq!(status, expected_status, "{method} {path}");
        assert_eq!(response["error"], expected_error, "{method} {path}");
    }

    assert!(state.datasource().overrides().metrics.is_empty());
    assert_eq!(upstream.total_calls(), 0);
}

#[tokio::test]
async fn test_cancellation_aborts_fetch() {
    let upstream = MockUpstream::start(vec![(
        METRICS,
        MockResponse::json(json!({"metrics": []})).delayed(Duration::from_secs(5)),
    )])
    .await;

    let datasource = Datasource::new();
    let settings = InstanceSettings::new(json!({"url": upstream.url()}));
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let response = datasource
        .call_resource(
            Some(&settings),
            &ResourceRequest::new("GET", "schema/metrics"),
            &token,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.error_message(), Some("mirador request cancelled"));
    assert!(!datasource.cache().metrics.is_fresh());
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let upstream = MockUpstream::start(vec![(
        METRICS,
        MockResponse::json(json!({"metrics": []})).delayed(Duration::from_secs(5)),
    )])
    .await;

    let datasource = Datasource::new();
    let settings = InstanceSettings::new(json!({"url": upstream.url(), "timeoutMs": 100}));

    let response = datasource
        .call_resource(
            Some(&settings),
            &ResourceRequest::new("GET", "schema/metrics"),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response
        .error_message()
        .unwrap()
        .starts_with("mirador transport error"));
}
