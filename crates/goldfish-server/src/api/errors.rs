//! Error handling for the Goldfish Server API
//!
//! Every failure leaves the API in the same JSON envelope:
//! `{"error": .., "errorDetails": {"errorCode": .., "errorMessage": ..}}`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use goldfish_core::CoreError;
use serde_json::json;

use crate::error::ServerError;

/// API Error type for returning standard error responses
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),
    /// Not found (404)
    NotFound(String),
    /// Wrapped server error
    ServerError(ServerError),
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        ApiError::ServerError(err)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::ServerError(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::ServerError(err) => write!(f, "Server Error: {}", err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "ERR_BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "ERR_NOT_FOUND", msg),
            ApiError::ServerError(err) => return api_error_response(&err),
        };

        error_body(status, error_code, &message)
    }
}

/// Convert a server error into a standardized API error response
pub fn api_error_response(err: &ServerError) -> Response {
    let (status, error_code) = match err {
        ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "ERR_NOT_FOUND"),
        ServerError::ValidationError(_) => (StatusCode::BAD_REQUEST, "ERR_VALIDATION_ERROR"),
        ServerError::StoreError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ERR_STORE_ERROR"),
        ServerError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ERR_CONFIG_ERROR"),
        ServerError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ERR_INTERNAL_SERVER_ERROR"),
    };

    error_body(status, error_code, &err.to_string())
}

fn error_body(status: StatusCode, error_code: &str, message: &str) -> Response {
    let body = Json(json!({
        "error": message,
        "errorDetails": {
            "errorCode": error_code,
            "errorMessage": message,
        }
    }));

    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_map_to_status_codes() {
        let cases = [
            (ServerError::NotFound("Graph g1".into()), StatusCode::NOT_FOUND),
            (ServerError::ValidationError("bad".into()), StatusCode::BAD_REQUEST),
            (ServerError::StoreError("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServerError::InternalError("oops".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(api_error_response(&err).status(), status);
        }
    }

    #[test]
    fn api_errors_use_their_own_status() {
        assert_eq!(
            ApiError::BadRequest("nope".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CoreError::not_found("Process", "p1")).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
