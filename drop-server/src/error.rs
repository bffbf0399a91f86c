use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use drop_error::DropError;
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Request-boundary error. Every failure leaving a handler is converted
/// into a JSON `{"error": ...}` body with a matching status code; nothing
/// crashes the process.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl From<DropError> for ApiError {
    fn from(err: DropError) -> Self {
        match err {
            DropError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
