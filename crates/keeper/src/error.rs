use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use keeper_cloud::ComputeError;

/// Handler failure, rendered as `500 {"detail": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match &self {
            ApiError::Compute(e) => e.detail(),
        };
        tracing::error!(%detail, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "detail": detail })),
        )
            .into_response()
    }
}
