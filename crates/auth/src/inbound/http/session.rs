use app_core::jwt::Claims;
use app_core::response::Response;
use axum::debug_handler;

use crate::inbound::model::prelude::*;

/// Echoes the caller's validated session claims.
#[debug_handler]
pub async fn session(claims: Claims) -> Response<SessionResponse> {
    Response::from(SessionResponse::from(claims))
}
