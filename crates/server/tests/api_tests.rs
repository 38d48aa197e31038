//! Integration tests for the HTTP API endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestServer;
use lantern_cache::KvStore;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Helper to make JSON requests.
async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_ok_with_a_timestamp() {
    let server = TestServer::new().await;
    let (status, body) = json_request(&server.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().unwrap().starts_with("20"));
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let server = TestServer::new().await;
    let (status, body) = json_request(&server.router, "POST", "/api/nope", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("no such route"));
}

#[tokio::test]
async fn preflight_carries_cors_headers() {
    let server = TestServer::new().await;
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/explain")
        .header("Origin", "https://cms.example")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(headers["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .contains("POST"));
}

#[tokio::test]
async fn explain_rejects_an_empty_question() {
    let server = TestServer::new().await;
    let (status, body) = json_request(
        &server.router,
        "POST",
        "/api/explain",
        Some(json!({ "question": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("question"));
}

#[tokio::test]
async fn explain_rejects_a_non_object_body() {
    let server = TestServer::new().await;
    let (status, body) = json_request(
        &server.router,
        "POST",
        "/api/explain",
        Some(json!("just a string")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn explain_rejects_a_bad_tenant() {
    let server = TestServer::new().await;
    let (status, body) = json_request(
        &server.router,
        "POST",
        "/api/explain",
        Some(json!({ "question": "why?", "tenant": "Not;Valid" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("tenant"));
}

#[tokio::test]
async fn explain_returns_explanation_trace_config_and_debug() {
    let server = TestServer::new().await;
    let (status, body) = json_request(
        &server.router,
        "POST",
        "/api/explain",
        Some(json!({
            "question": "Why is Lake Boga Motel on /stay?",
            "pageUri": "/stay",
            "history": [
                {"role": "user", "content": "earlier question"},
                {"role": "bogus", "content": "dropped"}
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["explanation"],
        "This component hand-picks two places to stay."
    );
    assert_eq!(body["trace"].as_array().unwrap().len(), 9);
    assert_eq!(body["config"]["limit"], 6);
    assert_eq!(body["debug"]["intent"]["domain"], "page_component");
    assert!(body["debug"]["timing"]["totalMs"].is_number());

    // Alphabetical ordering put Big River Cruises first.
    let last_step = body["trace"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last_step["step"], "limit");
    assert_eq!(last_step["productIds"][0], 1);
    assert_eq!(last_step["targetPresent"], true);
}

#[tokio::test]
async fn stream_emits_metadata_first_and_done_last() {
    let server = TestServer::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/explain/stream")
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({ "question": "Why is Lake Boga Motel on /stay?", "pageUri": "/stay" })
                .to_string(),
        ))
        .unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap(),
        "text/event-stream"
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(body.starts_with("event: metadata\ndata: "), "body: {body}");
    let metadata_line = body.lines().nth(1).unwrap().strip_prefix("data: ").unwrap();
    let metadata: Value = serde_json::from_str(metadata_line).unwrap();
    assert_eq!(metadata["trace"].as_array().unwrap().len(), 9);

    assert!(body.contains("data: This component "));
    assert!(body.trim_end().ends_with("event: done\ndata: {}"));
}

#[tokio::test]
async fn resolve_tenant_maps_known_hostnames() {
    let server = TestServer::new().await;
    server
        .kv
        .put(
            "origin:visitswanhill.com.au",
            "swanhill.com.au".to_string(),
            None,
        )
        .await
        .unwrap();

    let (status, body) = json_request(
        &server.router,
        "POST",
        "/api/resolve-tenant",
        Some(json!({ "hostname": "visitswanhill.com.au" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant"], "swanhill");

    let (status, body) = json_request(
        &server.router,
        "POST",
        "/api/resolve-tenant",
        Some(json!({ "hostname": "unknown.example" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant"], Value::Null);
}

#[tokio::test]
async fn refresh_schema_deletes_the_cached_entry() {
    let server = TestServer::new().await;
    server
        .kv
        .put("schema:testtenant", "{}".to_string(), None)
        .await
        .unwrap();

    let (status, body) =
        json_request(&server.router, "POST", "/api/refresh-schema", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tenant"], "testtenant");
    assert_eq!(server.kv.get("schema:testtenant").await.unwrap(), None);
}

#[tokio::test]
async fn refresh_schema_validates_an_explicit_tenant() {
    let server = TestServer::new().await;
    let (status, _) = json_request(
        &server.router,
        "POST",
        "/api/refresh-schema",
        Some(json!({ "tenant": "Bad Tenant" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
