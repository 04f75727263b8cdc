//! Defines application-specific Axum middleware.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;

use super::error::AppError;
use super::jwt::{Claims, TokenManager};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request id attached to every log event of that request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Handlers mounted without the logger still get a usable id.
        Ok(parts
            .extensions
            .get::<CorrelationId>()
            .cloned()
            .unwrap_or_else(|| CorrelationId(uuid::Uuid::new_v4().to_string())))
    }
}

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required.".to_string()))
    }
}

pub async fn auth(
    State(tm): State<Arc<dyn TokenManager>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid authorization header".to_string()))?;

    let claims = tm.validate_session_token(token)?;

    let (mut parts, body) = req.into_parts();
    parts.extensions.insert(claims);
    let req = Request::from_parts(parts, body);

    Ok(next.run(req).await)
}

pub async fn request_response_logger(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let start_time = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().path().to_string();
    let version = req.version();

    let c_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    req.extensions_mut().insert(CorrelationId(c_id.clone()));

    // Only the path is logged; the callback query carries the authorization code.
    tracing::info!(
        _cID = c_id,
        method = %method,
        uri = %uri,
        version = ?version,
        "Incoming request"
    );

    let mut response = next.run(req).await;

    let duration = start_time.elapsed();
    let status = response.status();

    response.headers_mut().insert(
        HeaderName::from_static(REQUEST_ID_HEADER),
        HeaderValue::from_str(c_id.as_str()).unwrap_or_else(|_| HeaderValue::from_static("invalid-correlation-id")),
    );

    if status.is_server_error() {
        tracing::error!(
            _cID = c_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            _cID = c_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        tracing::info!(
            _cID = c_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis(),
            "Request completed successfully"
        );
    }

    Ok(response)
}
