use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose;
use oauth2::{AccessToken, AuthorizationCode, TokenUrl};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use super::{ClientCredentials, ExternalProfile, OAuthError, OAuthSettings, OutboundRequest};

const JSON_MEDIA_TYPE: &str = "application/json";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Which provider wire format to speak, selected from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    GitHub,
    Generic,
}

/// Wire format of one identity provider.
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn build_token_request(
        &self,
        code: &AuthorizationCode,
        credentials: &ClientCredentials,
    ) -> Result<OutboundRequest, OAuthError>;

    fn parse_token_response(&self, body: &[u8]) -> Result<AccessToken, OAuthError> {
        parse_access_token(body)
    }

    fn build_profile_request(&self, access_token: &AccessToken) -> Result<OutboundRequest, OAuthError>;

    fn parse_profile_response(&self, body: &[u8]) -> Result<ExternalProfile, OAuthError>;
}

pub fn build_adapter(settings: &OAuthSettings) -> Result<Arc<dyn ProviderAdapter>, OAuthError> {
    let token_url = TokenUrl::new(settings.token_url.clone())?;
    let profile_url = Url::parse(&settings.profile_url)?;

    Ok(match settings.provider {
        ProviderKind::GitHub => Arc::new(GitHubAdapter::new(token_url, profile_url, &settings.user_agent)?),
        ProviderKind::Generic => Arc::new(GenericAdapter::new(token_url, profile_url)),
    })
}

// ===== GitHub =====

/// GitHub OAuth apps: JSON token exchange with credentials in the body and a
/// numeric `id` on the `/user` profile.
pub struct GitHubAdapter {
    token_url: TokenUrl,
    profile_url: Url,
    user_agent: HeaderValue,
}

impl GitHubAdapter {
    pub fn new(token_url: TokenUrl, profile_url: Url, user_agent: &str) -> Result<Self, OAuthError> {
        let user_agent =
            HeaderValue::from_str(user_agent).map_err(|e| OAuthError::InvalidRequest(format!("user agent: {e}")))?;
        Ok(Self { token_url, profile_url, user_agent })
    }
}

#[derive(Deserialize)]
struct GitHubProfile {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
    html_url: Option<String>,
}

impl ProviderAdapter for GitHubAdapter {
    fn name(&self) -> &'static str {
        "github"
    }

    fn build_token_request(
        &self,
        code: &AuthorizationCode,
        credentials: &ClientCredentials,
    ) -> Result<OutboundRequest, OAuthError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert(USER_AGENT, self.user_agent.clone());

        Ok(OutboundRequest {
            method: Method::POST,
            url: self.token_url.url().clone(),
            headers,
            body: Some(token_request_body(code, credentials)),
        })
    }

    fn build_profile_request(&self, access_token: &AccessToken) -> Result<OutboundRequest, OAuthError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers.insert(AUTHORIZATION, bearer(access_token)?);

        Ok(OutboundRequest { method: Method::GET, url: self.profile_url.clone(), headers, body: None })
    }

    fn parse_profile_response(&self, body: &[u8]) -> Result<ExternalProfile, OAuthError> {
        let profile: GitHubProfile = parse_json(body, "profile")?;
        if profile.id == 0 {
            return Err(OAuthError::InvalidProfile);
        }

        Ok(ExternalProfile {
            external_id: profile.id,
            email: profile.email.unwrap_or_default(),
            login: profile.login,
            display_name: profile.name,
            avatar_url: profile.avatar_url.unwrap_or_default(),
            profile_url: profile.html_url.unwrap_or_default(),
        })
    }
}

// ===== Generic =====

/// Providers that authenticate the token call with HTTP Basic and wrap the
/// profile in a `data` envelope keyed by a numeric `uid`.
pub struct GenericAdapter {
    token_url: TokenUrl,
    profile_url: Url,
}

impl GenericAdapter {
    pub fn new(token_url: TokenUrl, profile_url: Url) -> Self {
        Self { token_url, profile_url }
    }
}

#[derive(Deserialize)]
struct GenericProfileEnvelope {
    #[serde(default)]
    data: Option<GenericProfile>,
}

#[derive(Deserialize)]
struct GenericProfile {
    #[serde(default)]
    uid: i64,
    email: Option<String>,
    #[serde(default)]
    user_name: String,
    nick_name: Option<String>,
    avatar: Option<String>,
    github: Option<String>,
}

impl ProviderAdapter for GenericAdapter {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn build_token_request(
        &self,
        code: &AuthorizationCode,
        credentials: &ClientCredentials,
    ) -> Result<OutboundRequest, OAuthError> {
        let basic = general_purpose::STANDARD.encode(format!(
            "{}:{}",
            credentials.client_id.as_str(),
            credentials.client_secret.secret()
        ));
        let mut authorization = HeaderValue::from_str(&format!("Basic {basic}"))
            .map_err(|e| OAuthError::InvalidRequest(format!("basic auth header: {e}")))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert(AUTHORIZATION, authorization);

        Ok(OutboundRequest {
            method: Method::POST,
            url: self.token_url.url().clone(),
            headers,
            body: Some(token_request_body(code, credentials)),
        })
    }

    fn build_profile_request(&self, access_token: &AccessToken) -> Result<OutboundRequest, OAuthError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer(access_token)?);

        Ok(OutboundRequest { method: Method::GET, url: self.profile_url.clone(), headers, body: None })
    }

    fn parse_profile_response(&self, body: &[u8]) -> Result<ExternalProfile, OAuthError> {
        let envelope: GenericProfileEnvelope = parse_json(body, "profile")?;
        let profile = envelope.data.filter(|p| p.uid != 0).ok_or(OAuthError::InvalidProfile)?;

        Ok(ExternalProfile {
            external_id: profile.uid,
            email: profile.email.unwrap_or_default(),
            login: profile.user_name,
            display_name: profile.nick_name,
            avatar_url: profile.avatar.unwrap_or_default(),
            profile_url: profile.github.unwrap_or_default(),
        })
    }
}

// ===== Shared wire helpers =====

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

fn token_request_body(code: &AuthorizationCode, credentials: &ClientCredentials) -> Value {
    let mut body = Map::new();
    body.insert("client_id".to_string(), json!(credentials.client_id.as_str()));
    body.insert("client_secret".to_string(), json!(credentials.client_secret.secret()));
    body.insert("code".to_string(), json!(code.secret()));
    if let Some(redirect_uri) = &credentials.redirect_uri {
        body.insert("redirect_uri".to_string(), json!(redirect_uri.as_str()));
    }
    Value::Object(body)
}

fn parse_access_token(body: &[u8]) -> Result<AccessToken, OAuthError> {
    let response: TokenResponse = parse_json(body, "token")?;
    response
        .access_token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .map(AccessToken::new)
        .ok_or(OAuthError::EmptyToken)
}

fn bearer(access_token: &AccessToken) -> Result<HeaderValue, OAuthError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", access_token.secret()))
        .map_err(|e| OAuthError::InvalidRequest(format!("bearer header: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

fn parse_json<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, OAuthError> {
    serde_json::from_slice(body).map_err(|e| OAuthError::ResponseParse(format!("{what} response: {e}")))
}
