use crate::{error::AppError, AppState};
use analytics::{BenchmarkComparisonResult, BenchmarkRequest, MetricsResult};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub book_filter: String,
}

/// # GET /api/v1/metrics?book_filter=<book>
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<MetricsResult>, AppError> {
    let metrics = state.metrics.calculate(&query.book_filter).await?;
    Ok(Json(metrics.result))
}

/// # POST /api/v1/metrics/benchmark
/// Malformed bodies are reported through our own error shape rather than
/// axum's plain-text rejection.
pub async fn post_benchmark(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BenchmarkRequest>, JsonRejection>,
) -> Result<Json<BenchmarkComparisonResult>, AppError> {
    let Json(request) = payload?;
    let result = state.benchmark.compare(&request).await?;
    Ok(Json(result))
}
