//! HTTP-facing error type shared by every handler and middleware.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use super::jwt::JwtError;

const INTERNAL_MESSAGE: &str = "An internal server error occurred";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid request format: {0}")]
    RequestFormat(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("JWT operation failed")]
    Jwt(#[from] JwtError),

    #[error("An internal server error occurred")]
    Internal,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::RequestFormat(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::RequestFormat(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::Validation(err) => {
                let details = json!(err.field_errors());
                (StatusCode::BAD_REQUEST, "Validation failed".to_string(), Some(details))
            },
            AppError::RequestFormat(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Jwt(err) => match err {
                JwtError::TokenExpired | JwtError::InvalidToken => (StatusCode::UNAUTHORIZED, err.to_string(), None),
                JwtError::TokenCreation(_) => {
                    tracing::error!("JWT error: {:?}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string(), None)
                },
            },
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string(), None),
        };

        (status, Json(ErrorResponse { message, details })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use serde_json::Value;
    use validator::{ValidationError, ValidationErrors};

    use super::*;

    async fn extract_json_response(response: Response<Body>) -> (StatusCode, Value) {
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let json: Value = serde_json::from_slice(&body_bytes).expect("Failed to parse JSON response");
        (status, json)
    }

    #[tokio::test]
    async fn test_validation_error_is_bad_request_with_details() {
        let mut errors = ValidationErrors::new();
        let mut code_error = ValidationError::new("length");
        code_error.message = Some("Authorization code is required".into());
        errors.add("code", code_error);

        let (status, json) = extract_json_response(AppError::Validation(errors).into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Validation failed");
        assert_eq!(json["details"]["code"][0]["message"], "Authorization code is required");
    }

    #[tokio::test]
    async fn test_request_format_error() {
        let error = AppError::RequestFormat("Invalid request. Please try again later.".to_string());
        let (status, json) = extract_json_response(error.into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid request. Please try again later.");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_and_not_found() {
        let (status, json) =
            extract_json_response(AppError::Unauthorized("Authentication required.".to_string()).into_response()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Authentication required.");

        let error = AppError::NotFound("Endpoint not found".to_string());
        let (status, json) = extract_json_response(error.into_response()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Endpoint not found");
    }

    #[tokio::test]
    async fn test_jwt_errors() {
        let (status, json) = extract_json_response(AppError::Jwt(JwtError::TokenExpired).into_response()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Token has expired");

        let (status, json) = extract_json_response(AppError::Jwt(JwtError::InvalidToken).into_response()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Invalid token format or signature");

        let error = AppError::Jwt(JwtError::TokenCreation("bad key".to_string()));
        let (status, json) = extract_json_response(error.into_response()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let (status, json) = extract_json_response(AppError::Internal.into_response()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], INTERNAL_MESSAGE);
        assert!(json.get("details").is_none());
    }
}
