//! HTTP error mapping

use crate::error::{FrameError, MonitorError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    InvalidImage(String),
    PayloadTooLarge(String),
    NotFound(String),
    Producer(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            ApiError::InvalidImage(msg) => {
                tracing::debug!("rejecting frame: {}", msg);
                (StatusCode::BAD_REQUEST, "Invalid image")
            }
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.as_str()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            ApiError::Producer(msg) => {
                tracing::warn!("producer error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Perception backend error")
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::Frame(e @ FrameError::TooLarge { .. }) => {
                ApiError::PayloadTooLarge(e.to_string())
            }
            MonitorError::Frame(e) => ApiError::InvalidImage(e.to_string()),
            MonitorError::Fusion(e) => ApiError::BadRequest(e.to_string()),
            MonitorError::Producer(e) => ApiError::Producer(e.to_string()),
            MonitorError::Config(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("analysis task failed: {err}"))
    }
}
