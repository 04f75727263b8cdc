//! Signing and validation of session JSON Web Tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token format or signature")]
    InvalidToken,

    #[error("Failed to create token: {0}")]
    TokenCreation(String),
}

/// Identity fields embedded into a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSubject {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub avatar_url: String,
    pub profile_url: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub username: String,
    pub avatar_url: String,
    pub profile_url: String,
    /// Snapshot taken at issue time; later role changes do not alter it.
    #[serde(default)]
    pub permissions: Vec<String>,
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenManager: Send + Sync {
    fn create_session_token(&self, subject: &SessionSubject) -> Result<String, JwtError>;
    fn validate_session_token(&self, token: &str) -> Result<Claims, JwtError>;
}

pub struct JwtConfig {
    pub secret: String,
    pub exp_secs: i64,
    pub issuer: String,
    pub audience: String,
}

pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

impl TokenManager for JwtService {
    fn create_session_token(&self, subject: &SessionSubject) -> Result<String, JwtError> {
        let now = Utc::now();
        let exp = (now + Duration::seconds(self.config.exp_secs)).timestamp() as usize;
        let iat = now.timestamp() as usize;

        let claims = Claims {
            sub: subject.user_id,
            email: subject.email.clone(),
            username: subject.username.clone(),
            avatar_url: subject.avatar_url.clone(),
            profile_url: subject.profile_url.clone(),
            permissions: subject.permissions.clone(),
            jti: Uuid::new_v4().to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            exp,
            iat,
        };

        let header = Header::new(Algorithm::HS512);
        encode(&header, &claims, &EncodingKey::from_secret(self.config.secret.as_ref()))
            .map_err(|e| JwtError::TokenCreation(e.to_string()))
    }

    fn validate_session_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<Claims>(token, &DecodingKey::from_secret(self.config.secret.as_ref()), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::InvalidToken,
            })
    }
}
