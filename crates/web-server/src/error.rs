use analytics::AnalyticsError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] JsonRejection),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Analytics(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Analytics(err) => {
                tracing::error!(error = %err, "Analytics request failed.");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::MalformedBody(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
