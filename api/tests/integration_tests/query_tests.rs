//! Batched query tests.

use super::common::{frame_field, plugin_context, post_json, test_app, MockResponse, MockUpstream};
use axum::http::StatusCode;
use serde_json::{json, Value};

const LOGS_PATH: &str = "/api/v1/logs/query";
const METRICS_PATH: &str = "/api/v1/query";
const TRACES_PATH: &str = "/api/v1/traces/search";

fn time_range() -> Value {
    json!({"from": "2025-01-01T00:00:00Z", "to": "2025-01-01T01:00:00Z"})
}

async fn query(url: &str, queries: Value) -> (StatusCode, Value) {
    let (app, _) = test_app();
    post_json(
        app,
        "/api/v1/plugin/query",
        json!({"pluginContext": plugin_context(url), "queries": queries}),
    )
    .await
}

#[tokio::test]
async fn test_logs_query_builds_table_frame() {
    let upstream = MockUpstream::start(vec![(
        LOGS_PATH,
        MockResponse::json(json!({
            "results": [
                {"_time": "2025-01-01T00:00:00Z", "level": "ERROR", "service": "payments"},
                {"_time": "2025-01-01T00:00:05Z", "level": "WARN"}
            ],
            "total": 2,
            "took": 3
        })),
    )])
    .await;

    let (status, body) = query(
        &upstream.url(),
        json!([{
            "refId": "A",
            "json": {"queryType": "logs", "query": "level:ERROR", "limit": 100},
            "timeRange": time_range()
        }]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let result = &body["responses"]["A"];
    assert!(result.get("error").is_none());

    let frame = &result["frames"][0];
    assert_eq!(frame["name"], "logs");
    assert_eq!(frame["meta"]["preferredVisualization"], "table");
    assert_eq!(frame["fields"][0]["name"], "time");
    assert_eq!(frame_field(frame, "time")["values"][1], "2025-01-01T00:00:05Z");
    assert_eq!(frame_field(frame, "level")["values"], json!(["ERROR", "WARN"]));
    assert_eq!(frame_field(frame, "service")["values"], json!(["payments", ""]));

    let sent = upstream.last_request(LOGS_PATH).unwrap();
    assert_eq!(sent.method, "POST");
    assert_eq!(sent.body["query"], "level:ERROR");
    assert_eq!(sent.body["limit"], 100);
    assert_eq!(sent.body["timeRange"]["from"], "2025-01-01T00:00:00Z");
    assert_eq!(sent.body["timeRange"]["to"], "2025-01-01T01:00:00Z");
}

#[tokio::test]
async fn test_logs_query_without_range_omits_it() {
    let upstream =
        MockUpstream::start(vec![(LOGS_PATH, MockResponse::json(json!({"results": []})))]).await;

    let (_, body) = query(
        &upstream.url(),
        json!([{"refId": "A", "json": {"query": "*"}}]),
    )
    .await;

    let frame = &body["responses"]["A"]["frames"][0];
    assert_eq!(frame["name"], "logs");
    assert_eq!(frame_field(frame, "time")["values"], json!([]));

    let sent = upstream.last_request(LOGS_PATH).unwrap();
    assert_eq!(sent.body, json!({"query": "*"}));
}

#[tokio::test]
async fn test_metrics_query_uses_host_interval_as_step() {
    let upstream = MockUpstream::start(vec![(
        METRICS_PATH,
        MockResponse::json(json!({
            "status": "success",
            "data": {
                "resultType": "matrix",
                "result": [{
                    "metric": {"__name__": "http_requests_total", "service": "payments"},
                    "values": [[1735689600, "5"], [1735689660, "7.5"]]
                }]
            }
        })),
    )])
    .await;

    let (status, body) = query(
        &upstream.url(),
        json!([{
            "refId": "B",
            "json": {"queryType": "metrics", "query": "rate(http_requests_total[5m])"},
            "timeRange": time_range(),
            "intervalMs": 60000
        }]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let frame = &body["responses"]["B"]["frames"][0];
    assert_eq!(frame["name"], "http_requests_total");
    assert_eq!(frame["meta"]["preferredVisualization"], "graph");
    assert_eq!(frame["meta"]["custom"]["labels"]["service"], "payments");
    assert_eq!(
        frame_field(frame, "time")["values"],
        json!(["2025-01-01T00:00:00Z", "2025-01-01T00:01:00Z"])
    );
    assert_eq!(frame_field(frame, "value")["values"], json!([5.0, 7.5]));

    let sent = upstream.last_request(METRICS_PATH).unwrap();
    assert_eq!(sent.body["step"], "60s");
    assert_eq!(sent.body["start"], "2025-01-01T00:00:00Z");
    assert_eq!(sent.body["end"], "2025-01-01T01:00:00Z");
}

#[tokio::test]
async fn test_metrics_query_prefers_explicit_step() {
    let upstream = MockUpstream::start(vec![(
        METRICS_PATH,
        MockResponse::json(json!({"status": "success", "data": {"result": []}})),
    )])
    .await;

    let (_, body) = query(
        &upstream.url(),
        json!([{
            "refId": "B",
            "json": {"queryType": "METRICS", "query": "up", "step": "5m"},
            "timeRange": time_range(),
            "intervalMs": 15000
        }]),
    )
    .await;

    assert_eq!(body["responses"]["B"]["frames"][0]["name"], "metrics");
    assert_eq!(upstream.last_request(METRICS_PATH).unwrap().body["step"], "5m");
}

#[tokio::test]
async fn test_traces_query_accepts_both_data_shapes() {
    for data in [
        json!({"total": 1, "traces": [{"traceID": "abc", "duration": 1200, "spans": [{}, {}]}]}),
        json!([{"traceID": "abc", "duration": 1200, "spans": [{}, {}]}]),
    ] {
        let upstream = MockUpstream::start(vec![(
            TRACES_PATH,
            MockResponse::json(json!({"data": data, "status": "success"})),
        )])
        .await;

        let (_, body) = query(
            &upstream.url(),
            json!([{
                "refId": "C",
                "json": {"queryType": "traces", "query": "service=payments", "limit": 20},
                "timeRange": time_range()
            }]),
        )
        .await;

        let frame = &body["responses"]["C"]["frames"][0];
        assert_eq!(frame["name"], "traces");
        assert_eq!(frame_field(frame, "traceID")["values"], json!(["abc"]));
        assert_eq!(frame_field(frame, "duration")["values"], json!([1200]));
        assert_eq!(frame_field(frame, "spanCount")["values"], json!([2]));

        let sent = upstream.last_request(TRACES_PATH).unwrap();
        assert_eq!(sent.body["limit"], 20);
        assert_eq!(sent.body["start"], "2025-01-01T00:00:00Z");
    }
}

#[tokio::test]
async fn test_upstream_failure_is_internal() {
    let upstream = MockUpstream::start(vec![(
        LOGS_PATH,
        MockResponse::status(StatusCode::INTERNAL_SERVER_ERROR),
    )])
    .await;

    let (status, body) = query(
        &upstream.url(),
        json!([{"refId": "A", "json": {"query": "*"}}]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["responses"]["A"]["status"], "internal");
    assert_eq!(
        body["responses"]["A"]["error"],
        "mirador request failed: 500 Internal Server Error"
    );
}

#[tokio::test]
async fn test_mixed_batch_fails_per_query() {
    let upstream = MockUpstream::start(vec![
        (LOGS_PATH, MockResponse::json(json!({"results": []}))),
        (
            METRICS_PATH,
            MockResponse::status(StatusCode::SERVICE_UNAVAILABLE),
        ),
    ])
    .await;

    let (_, body) = query(
        &upstream.url(),
        json!([
            {"refId": "A", "json": {"queryType": "logs", "query": "*"}},
            {"refId": "B", "json": {"queryType": "metrics", "query": "up"}, "timeRange": time_range()},
            {"refId": "C", "json": {"queryType": "logs", "limit": "many"}}
        ]),
    )
    .await;

    let responses = body["responses"].as_object().unwrap();
    assert_eq!(responses.len(), 3);
    assert!(responses["A"].get("error").is_none());
    assert_eq!(responses["B"]["status"], "internal");
    assert_eq!(responses["C"]["status"], "bad_request");
    assert!(responses["C"]["error"]
        .as_str()
        .unwrap()
        .starts_with("json unmarshal"));
    assert_eq!(upstream.calls(LOGS_PATH), 1);
    assert_eq!(upstream.calls(METRICS_PATH), 1);
}

#[tokio::test]
async fn test_credentials_are_forwarded() {
    let upstream =
        MockUpstream::start(vec![(LOGS_PATH, MockResponse::json(json!({"results": []})))]).await;

    query(
        &upstream.url(),
        json!([{"refId": "A", "json": {"query": "*"}}]),
    )
    .await;

    let sent = upstream.last_request(LOGS_PATH).unwrap();
    assert_eq!(sent.headers["authorization"], "Bearer secret-token");
    assert_eq!(sent.headers["x-mirador-tenant"], "acme");
    assert_eq!(sent.headers["content-type"], "application/json");
}

#[tokio::test]
async fn test_missing_url_is_bad_request() {
    let (app, _) = test_app();

    let (_, body) = post_json(
        app,
        "/api/v1/plugin/query",
        json!({
            "pluginContext": {"instanceSettings": {"jsonData": {"tenantId": "acme"}}},
            "queries": [{"refId": "A", "json": {"query": "*"}}]
        }),
    )
    .await;

    assert_eq!(body["responses"]["A"]["status"], "bad_request");
    assert_eq!(body["responses"]["A"]["error"], "Mirador API URL is not configured");
}

#[tokio::test]
async fn test_undecodable_upstream_body_is_internal() {
    let upstream = MockUpstream::start(vec![(
        METRICS_PATH,
        MockResponse::json(json!({"data": {"result": "not a list"}})),
    )])
    .await;

    let (_, body) = query(
        &upstream.url(),
        json!([{"refId": "B", "json": {"queryType": "metrics", "query": "up"}}]),
    )
    .await;

    assert_eq!(body["responses"]["B"]["status"], "internal");
    assert!(body["responses"]["B"]["error"]
        .as_str()
        .unwrap()
        .starts_with("invalid mirador response"));
}

#[tokio::test]
async fn test_null_upstream_lists_yield_empty_frames() {
    let upstream = MockUpstream::start(vec![
        (
            LOGS_PATH,
            MockResponse::json(json!({"results": null, "total": 0, "took": 1})),
        ),
        (
            METRICS_PATH,
            MockResponse::json(json!({"status": "success", "data": {"resultType": "matrix", "result": null}})),
        ),
        (
            TRACES_PATH,
            MockResponse::json(json!({"data": {"total": 0, "traces": null}, "status": "success"})),
        ),
    ])
    .await;

    let (status, body) = query(
        &upstream.url(),
        json!([
            {"refId": "A", "json": {"queryType": "logs", "query": "*"}},
            {"refId": "B", "json": {"queryType": "metrics", "query": "up"}},
            {"refId": "C", "json": {"queryType": "traces", "query": "*"}}
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("results").is_none());
    for (ref_id, frame_name) in [("A", "logs"), ("B", "metrics"), ("C", "traces")] {
        let result = &body["responses"][ref_id];
        assert!(result.get("error").is_none(), "{ref_id}: {result}");
        assert_eq!(result["frames"][0]["name"], frame_name);
    }
}
