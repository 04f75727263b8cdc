use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use oauth2::{AccessToken, AuthorizationCode};
use reqwest::{Client, ClientBuilder, redirect};

use super::adapter::{ProviderAdapter, build_adapter};
use super::{ClientCredentials, ExternalProfile, OAuthError, OAuthSettings, OutboundRequest};

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CodeExchanger: Send + Sync {
    async fn exchange_code(&self, code: &AuthorizationCode) -> Result<AccessToken, OAuthError>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(&self, access_token: &AccessToken) -> Result<ExternalProfile, OAuthError>;
}

/// Talks to one identity provider through its [`ProviderAdapter`].
pub struct OAuthClient {
    adapter: Arc<dyn ProviderAdapter>,
    credentials: ClientCredentials,
    http: Client,
}

impl OAuthClient {
    pub fn new(adapter: Arc<dyn ProviderAdapter>, credentials: ClientCredentials, http: Client) -> Self {
        Self { adapter, credentials, http }
    }

    pub fn from_settings(settings: &OAuthSettings) -> Result<Self, OAuthError> {
        let http = ClientBuilder::new()
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self::new(build_adapter(settings)?, ClientCredentials::from_settings(settings)?, http))
    }

    pub fn provider(&self) -> &'static str {
        self.adapter.name()
    }

    async fn send(&self, request: OutboundRequest) -> Result<(reqwest::StatusCode, Vec<u8>), OAuthError> {
        tracing::debug!(provider = self.adapter.name(), request = ?request, "Sending OAuth request");

        let OutboundRequest { method, url, headers, body } = request;
        let mut builder = self.http.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        Ok((status, bytes.to_vec()))
    }
}

#[async_trait]
impl CodeExchanger for OAuthClient {
    async fn exchange_code(&self, code: &AuthorizationCode) -> Result<AccessToken, OAuthError> {
        let request = self.adapter.build_token_request(code, &self.credentials)?;
        let (status, body) = self.send(request).await?;

        // Providers report bad codes with a 200 and an error object, so the
        // body decides the outcome rather than the status.
        self.adapter.parse_token_response(&body).inspect_err(|e| {
            tracing::warn!(provider = self.adapter.name(), status = %status, error = %e, "Token exchange rejected");
        })
    }
}

#[async_trait]
impl ProfileFetcher for OAuthClient {
    async fn fetch_profile(&self, access_token: &AccessToken) -> Result<ExternalProfile, OAuthError> {
        let request = self.adapter.build_profile_request(access_token)?;
        let (status, body) = self.send(request).await?;

        if !status.is_success() {
            return Err(OAuthError::ResponseParse(format!("profile endpoint returned {status}")));
        }

        self.adapter.parse_profile_response(&body)
    }
}
