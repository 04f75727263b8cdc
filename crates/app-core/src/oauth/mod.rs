//! OAuth 2.0 authorization-code login against a configurable identity provider.
//!
//! The wire format of each provider lives behind [`ProviderAdapter`]; the
//! transport ([`OAuthClient`]) is shared, so supporting a new provider never
//! forks the login pipeline.

mod adapter;
mod client;

use std::fmt;

pub use adapter::{GenericAdapter, GitHubAdapter, ProviderAdapter, ProviderKind, build_adapter};
pub use client::{CodeExchanger, OAuthClient, ProfileFetcher};
#[cfg(any(test, feature = "testing"))]
pub use client::{MockCodeExchanger, MockProfileFetcher};
use oauth2::{ClientId, ClientSecret, RedirectUrl};
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USER_AGENT: &str = "oauth-login";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] oauth2::url::ParseError),

    #[error("Invalid outbound request: {0}")]
    InvalidRequest(String),

    #[error("HTTP transport error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse provider response: {0}")]
    ResponseParse(String),

    #[error("Provider returned an empty access token")]
    EmptyToken,

    #[error("Provider profile has no usable external id")]
    InvalidProfile,
}

/// The `oauth` configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthSettings {
    pub provider: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    pub token_url: String,
    pub profile_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Client registration shared by every token exchange.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub redirect_uri: Option<RedirectUrl>,
}

impl ClientCredentials {
    pub fn from_settings(settings: &OAuthSettings) -> Result<Self, OAuthError> {
        let redirect_uri = settings
            .redirect_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .map(|uri| RedirectUrl::new(uri.to_string()))
            .transpose()?;

        Ok(Self {
            client_id: ClientId::new(settings.client_id.clone()),
            client_secret: ClientSecret::new(settings.client_secret.clone()),
            redirect_uri,
        })
    }
}

/// A provider profile normalized to the fields the login pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub external_id: i64,
    pub email: String,
    pub login: String,
    pub display_name: Option<String>,
    pub avatar_url: String,
    pub profile_url: String,
}

impl ExternalProfile {
    /// Display name when the provider has a non-blank one, login handle otherwise.
    pub fn username(&self) -> &str {
        self.display_name.as_deref().map(str::trim).filter(|name| !name.is_empty()).unwrap_or(&self.login)
    }
}

/// One outbound HTTP call, fully described before it is sent.
///
/// Each call builds its own descriptor; headers are never shared between the
/// token exchange and the profile fetch.
#[derive(Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers.keys().map(|name| name.as_str()).collect::<Vec<_>>())
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
