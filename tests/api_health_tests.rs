//! 健康检查 API 集成测试

use axum::http::StatusCode;
use std::sync::Arc;

mod common;
use common::{body_json, create_test_app, send_json, InMemoryMemberRepository};

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(Arc::new(InMemoryMemberRepository::new()));

    let response = send_json(app, "GET", "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["uptime_secs"].is_number());
}

#[tokio::test]
async fn test_readiness_endpoint() {
    let app = create_test_app(Arc::new(InMemoryMemberRepository::new()));

    let response = send_json(app, "GET", "/ready", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["ready"], true);
    assert_eq!(json["checks"][0]["name"], "database");
    assert_eq!(json["checks"][0]["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_when_store_unavailable() {
    let app = create_test_app(Arc::new(InMemoryMemberRepository::unavailable()));

    let response = send_json(app, "GET", "/ready", None, None).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["ready"], false);
    assert_eq!(json["checks"][0]["status"], "unhealthy");
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_test_app(Arc::new(InMemoryMemberRepository::new()));

    let response = send_json(app, "GET", "/api/unknown", None, None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trace_id_echoed() {
    let app = create_test_app(Arc::new(InMemoryMemberRepository::new()));

    let response = send_json(app, "GET", "/health", None, None).await;

    assert!(response.headers().contains_key("x-trace-id"));
}
