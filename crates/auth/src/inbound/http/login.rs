use app_core::error::AppError;
use app_core::extractors::{AppJson, AppQuery};
use app_core::middleware::CorrelationId;
use app_core::response::Response;
use axum::debug_handler;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

use crate::domain::inout::prelude::*;
use crate::inbound::model::prelude::*;
use crate::inbound::state::AuthState;

const MISSING_CODE: &str = "missing_code";

#[debug_handler]
pub async fn login(
    State(state): State<AuthState>,
    c_id: CorrelationId,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Response<LoginResponse>, AppError> {
    let ctx = state.login_context(c_id);

    state
        .login
        .login(&ctx, LoginInput { code: req.code })
        .await
        .map(|output| Response::with_message(LoginResponse::from(output), "Login successful"))
        .map_err(AppError::from)
}

/// Browser entry point: the provider redirects here, and the user is sent on
/// to the frontend with either a session token or a reason code.
#[debug_handler]
pub async fn oauth_callback(
    State(state): State<AuthState>,
    c_id: CorrelationId,
    query: Result<AppQuery<CallbackRequest>, AppError>,
) -> impl IntoResponse {
    let frontend_url = state.frontend_url();

    // A browser must always land back on the frontend, even for a query it cannot parse.
    let query = match query {
        Ok(AppQuery(query)) => query,
        Err(err) => {
            tracing::warn!(_cID = c_id.as_str(), error = %err, "Unreadable callback query");
            return found(format!("{frontend_url}/login?error={MISSING_CODE}"));
        },
    };

    if let Some(error) = &query.error {
        tracing::warn!(
            _cID = c_id.as_str(),
            error = error.as_str(),
            description = query.error_description.as_deref().unwrap_or_default(),
            "Provider returned an error to the callback"
        );
    }

    let Some(code) = query.code.filter(|code| !code.trim().is_empty()) else {
        return found(format!("{frontend_url}/login?error={MISSING_CODE}"));
    };

    let ctx = state.login_context(c_id);
    match state.login.login(&ctx, LoginInput { code }).await {
        Ok(output) => found(format!("{frontend_url}/?token={}", output.token)),
        Err(err) => found(format!("{frontend_url}/login?error={}", err.reason_code())),
    }
}

fn found(location: String) -> (StatusCode, [(header::HeaderName, String); 1]) {
    (StatusCode::FOUND, [(header::LOCATION, location)])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use app_core::config::Config;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use axum::routing::{get, post};
    use chrono::Utc;
    use serde_json::Value;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::entity::permission::PermissionSet;
    use crate::domain::entity::user::User;
    use crate::domain::error::{LoginError, LoginErrorKind, LoginStage};
    use crate::usecase::login::MockLoginUseCase;

    fn app(login: MockLoginUseCase) -> Router {
        let config = Config::builder_test().with("app.frontend_url", "https://app.example.com/").build();
        let state = AuthState::new(Arc::new(config), CancellationToken::new(), Arc::new(login));

        Router::new()
            .route("/auth/login", post(super::login))
            .route("/auth/callback", get(oauth_callback))
            .with_state(state)
    }

    fn output() -> LoginOutput {
        LoginOutput {
            user: User {
                id: 1001,
                external_id: 42,
                email: "a@b.com".to_string(),
                username: "octocat".to_string(),
                avatar_url: String::new(),
                profile_url: String::new(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            permissions: PermissionSet::from_iter(["event:read"]),
            token: "signed.jwt.token".to_string(),
        }
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().method(Method::GET).uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location(response: &axum::response::Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut login = MockLoginUseCase::new();
        login.expect_login().withf(|_, input| input.code == "abc").times(1).returning(|_, _| Ok(output()));

        let response = app(login).oneshot(json_request(r#"{"code":"abc"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["data"]["token"], "signed.jwt.token");
        assert_eq!(body["data"]["user"]["id"], 1001);
        assert_eq!(body["data"]["permissions"], serde_json::json!(["event:read"]));
    }

    #[tokio::test]
    async fn test_login_pipeline_failure_is_generic_500() {
        let mut login = MockLoginUseCase::new();
        login.expect_login().returning(|_, _| {
            Err(LoginError::failed(LoginStage::Reconcile, LoginErrorKind::Persistence("database is locked".into())))
        });

        let response = app(login).oneshot(json_request(r#"{"code":"abc"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "An internal server error occurred");
    }

    #[tokio::test]
    async fn test_login_malformed_json_is_400() {
        let mut login = MockLoginUseCase::new();
        login.expect_login().times(0);

        let response = app(login).oneshot(json_request(r#"{"code":"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_callback_success_redirects_with_token() {
        let mut login = MockLoginUseCase::new();
        login.expect_login().withf(|_, input| input.code == "abc").times(1).returning(|_, _| Ok(output()));

        let response = app(login).oneshot(get_request("/auth/callback?code=abc&state=xyz")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "https://app.example.com/?token=signed.jwt.token");
    }

    #[tokio::test]
    async fn test_callback_without_code_makes_no_call() {
        let mut login = MockLoginUseCase::new();
        login.expect_login().times(0);

        let response = app(login).oneshot(get_request("/auth/callback")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "https://app.example.com/login?error=missing_code");
    }

    #[tokio::test]
    async fn test_callback_unreadable_query_still_redirects() {
        let mut login = MockLoginUseCase::new();
        login.expect_login().times(0);

        let response = app(login).oneshot(get_request("/auth/callback?code=a&code=b")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "https://app.example.com/login?error=missing_code");
    }

    #[tokio::test]
    async fn test_callback_provider_error_without_code() {
        let mut login = MockLoginUseCase::new();
        login.expect_login().times(0);

        let response = app(login)
            .oneshot(get_request("/auth/callback?error=access_denied&error_description=denied"))
            .await
            .unwrap();

        assert_eq!(location(&response), "https://app.example.com/login?error=missing_code");
    }

    #[tokio::test]
    async fn test_callback_failure_redirects_with_reason() {
        let mut login = MockLoginUseCase::new();
        login
            .expect_login()
            .returning(|_, _| Err(LoginError::failed(LoginStage::Exchange, LoginErrorKind::EmptyToken)));

        let response = app(login).oneshot(get_request("/auth/callback?code=abc")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "https://app.example.com/login?error=invalid_token");
    }
}
