use analytics::AnalyticsSettings;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sources::{Snapshot, SnapshotStore, Sources};
use std::sync::Arc;
use tower::ServiceExt;
use web_server::{router, AppState};

fn app() -> Router {
    let snapshot: Snapshot = serde_json::from_value(json!({
        "trades": [
            {"ticker": "D05", "side": "buy", "quantity": 100, "price": 30,
             "trade_date": "2023-01-03", "book": "Core"}
        ],
        "positions": [
            {"ticker": "D05", "quantity": 100, "market_value": 3600, "book": "Core"}
        ],
        "prices": {
            "ES3": [
                {"timestamp": "2023-01-03T00:00:00Z", "price": 3.2, "currency": "SGD"},
                {"timestamp": "2024-01-02T00:00:00Z", "price": 3.4, "currency": "SGD"}
            ],
            "G3B": [
                {"timestamp": "2023-01-03T00:00:00Z", "price": 3.0, "currency": "SGD"},
                {"timestamp": "2024-01-02T00:00:00Z", "price": 3.3, "currency": "SGD"}
            ]
        },
        "instruments": {
            "D05": {"currency": "SGD"},
            "ES3": {"currency": "SGD"},
            "G3B": {"currency": "SGD"}
        }
    }))
    .unwrap();
    let sources = Sources::from_backend(Arc::new(SnapshotStore::new(snapshot, "Default")));
    router(Arc::new(AppState::new(sources, AnalyticsSettings::new("SGD", "Default"))))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn benchmark_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/metrics/benchmark")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_works() {
    let response = app()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_for_book() {
    let (status, body) = send(
        Request::builder()
            .uri("/api/v1/metrics?book_filter=Core")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "Core");
    assert_eq!(body["total_price_paid"].as_f64(), Some(3000.0));
    assert_eq!(body["market_value"].as_f64(), Some(3600.0));
    assert!(body["irr"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn metrics_without_filter_has_no_label() {
    let request = Request::builder()
        .uri("/api/v1/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("label").is_none());
}

#[tokio::test]
async fn metrics_error_is_500() {
    // Nothing in this book, so there is no timeline to solve.
    let (status, body) = send(
        Request::builder()
            .uri("/api/v1/metrics?book_filter=Empty")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn benchmark_comparison() {
    let (status, body) = send(benchmark_request(
        r#"{
            "book_filter": "Core",
            "benchmark_tickers": [{"ticker": "ES3", "weight": 1}, {"ticker": "G3B", "weight": 1}],
            "mode": "buy_at_start",
            "notional": 3000,
            "benchmark_cost": {"pct": 0.001, "absolute": 5}
        }"#,
    ))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["benchmark"]["fees"].as_f64(), Some(5.0));
    assert_eq!(body["benchmark"]["price_paid"].as_f64(), Some(3005.0));
    assert!(["portfolio", "benchmark", "tie"].contains(&body["winner"].as_str().unwrap()));
    assert!(body["benchmark_cash_flows"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let (status, body) = send(benchmark_request("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn unsupported_mode_is_400() {
    let (status, body) = send(benchmark_request(
        r#"{"benchmark_tickers": [{"ticker": "ES3", "weight": 1}, {"ticker": "G3B", "weight": 1}],
            "mode": "dca"}"#,
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("dca"));
}

#[tokio::test]
async fn invalid_basket_is_400() {
    let (status, _) = send(benchmark_request(
        r#"{"benchmark_tickers": [{"ticker": "ES3", "weight": 1}], "mode": "match_trades"}"#,
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_trades_is_500() {
    let (status, body) = send(benchmark_request(
        r#"{"book_filter": "Nobody",
            "benchmark_tickers": [{"ticker": "ES3", "weight": 1}, {"ticker": "G3B", "weight": 1}],
            "mode": "match_trades"}"#,
    ))
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "No trades available to benchmark against");
}
