//! Error types for lingua-api
//!
//! API handler errors map onto HTTP status codes and a JSON error body,
//! with lingua-common errors classified by variant.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Azure OpenAI / Speech upstream failure (502)
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// Per-user request quota exhausted (429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// lingua-common error
    #[error("Common error: {0}")]
    Common(#[from] lingua_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Rate limit exceeded".to_string(),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Common(err) => return classify_common(err),
        };

        error_response(status, error_code, message)
    }
}

/// Map lingua-common error variants to HTTP statuses
fn classify_common(err: lingua_common::Error) -> Response {
    use lingua_common::Error;

    let (status, error_code, message) = match err {
        Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
        Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
        Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
        Error::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
        Error::ExternalService(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            other.to_string(),
        ),
    };

    error_response(status, error_code, message)
}

fn error_response(status: StatusCode, error_code: &str, message: String) -> Response {
    let body = Json(json!({
        "error": {
            "code": error_code,
            "message": message,
        }
    }));

    let mut response = (status, body).into_response();

    // 401 responses carry the challenge scheme expected by clients
    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            header::HeaderValue::from_static("Bearer"),
        );
    }

    response
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::NotFound("no such word".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthorized_carries_challenge_header() {
        let response = ApiError::Unauthorized("token expired".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).map(|v| v.as_bytes()),
            Some(b"Bearer".as_ref())
        );
    }

    #[test]
    fn common_invalid_input_maps_to_400() {
        let err = ApiError::Common(lingua_common::Error::InvalidInput("bad quality".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn common_external_service_maps_to_502() {
        let err = ApiError::Common(lingua_common::Error::ExternalService("tts failed".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
