use std::sync::Arc;

use app_core::jwt::TokenManager;
use app_core::middleware::auth;
use axum::routing::{get, post};
use axum::{Router, middleware};

use crate::inbound::http::login::*;
use crate::inbound::http::session::*;
use crate::inbound::state::AuthState;

pub fn create_router(state: AuthState, tm: Arc<dyn TokenManager>) -> Router {
    let protected_routes = Router::new()
        .route("/auth/session", get(session))
        .route_layer(middleware::from_fn_with_state(tm, auth));

    let public_routes = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/callback", get(oauth_callback));

    Router::new().merge(public_routes).merge(protected_routes).with_state(state)
}
