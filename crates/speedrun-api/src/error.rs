use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use speedrun_storage::StoreError;
use thiserror::Error;

/// Uniform error envelope, per §6: `{"error": "<message>"}` with one of
/// 400/404/408/504/500.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Store(StoreError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

impl From<tokio::time::error::Elapsed> for ApiError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ApiError::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        assert_eq!(status_of(ApiError::NotFound).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_timeout_maps_to_504() {
        assert_eq!(status_of(ApiError::Store(StoreError::Timeout)).await, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn elapsed_maps_to_408() {
        assert_eq!(status_of(ApiError::Timeout).await, StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn body_carries_error_message() {
        let response = ApiError::BadRequest("bad amount".to_string()).into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"], "bad amount");
    }
}
