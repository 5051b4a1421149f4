use crate::metrics::ProxyError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failure of a single request, rendered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        match err {
            // upstream status and body pass through untouched
            ProxyError::Upstream { status, body } => Self::new(status, body),
            ProxyError::Timeout(_) | ProxyError::Transport(_) | ProxyError::Malformed(_) => {
                Self::internal(err.to_string())
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
