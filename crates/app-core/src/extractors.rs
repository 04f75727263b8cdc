//! Axum extractors whose rejections render as [`AppError`] bodies.

use axum::body::Body;
use axum::extract::{FromRequest, FromRequestParts, Json, Query};
use axum::http::Request;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::error::AppError;

pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::from(rejection)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::{Method, StatusCode, Uri};
    use axum::routing::post;
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct CallbackParams {
        code: Option<String>,
        error: Option<String>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct CodeBody {
        code: String,
    }

    #[tokio::test]
    async fn test_app_query_optional_fields() {
        let uri = "/auth/callback?code=abc".parse::<Uri>().unwrap();
        let request = Request::builder().uri(uri).method(Method::GET).body(Body::empty()).unwrap();
        let (mut parts, _) = request.into_parts();

        let AppQuery(params) = AppQuery::<CallbackParams>::from_request_parts(&mut parts, &()).await.unwrap();

        assert_eq!(params, CallbackParams { code: Some("abc".to_string()), error: None });
    }

    #[tokio::test]
    async fn test_app_query_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Paging {
            page: u32,
        }

        let uri = "/items?page=first".parse::<Uri>().unwrap();
        let request = Request::builder().uri(uri).method(Method::GET).body(Body::empty()).unwrap();
        let (mut parts, _) = request.into_parts();

        let result = AppQuery::<Paging>::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(AppError::RequestFormat(_))));
    }

    #[tokio::test]
    async fn test_app_json_success() {
        let request = Request::builder()
            .method(Method::POST)
            .header("content-type", "application/json")
            .body(Body::from(r#"{"code":"abc"}"#))
            .unwrap();

        let AppJson(body) = AppJson::<CodeBody>::from_request(request, &()).await.unwrap();

        assert_eq!(body, CodeBody { code: "abc".to_string() });
    }

    #[tokio::test]
    async fn test_app_json_rejections_are_bad_request() {
        let app = Router::new().route("/login", post(|AppJson(body): AppJson<CodeBody>| async move { body.code }));

        for (content_type, payload) in
            [("application/json", "{invalid json}"), ("application/json", "{}"), ("text/plain", r#"{"code":"abc"}"#)]
        {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/login")
                .header("content-type", content_type)
                .body(Body::from(payload))
                .unwrap();

            let response = app.clone().oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "payload {payload:?} as {content_type}");
        }
    }
}
