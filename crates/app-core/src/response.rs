//! Defines a generic and structured wrapper for successful JSON API responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

#[derive(Serialize)]
pub struct Response<T> {
    message: String,
    data: T,
}

impl<T> Response<T> {
    pub fn with_message(data: T, message: &str) -> Self {
        Self { message: message.to_string(), data }
    }
}

impl<T> From<T> for Response<T> {
    fn from(data: T) -> Self {
        Self { message: "Successfully".to_string(), data }
    }
}

impl<T: Serialize> IntoResponse for Response<T> {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
