use std::fmt;

use app_core::error::AppError;
use app_core::jwt::JwtError;
use app_core::oauth::OAuthError;
use thiserror::Error;

/// Pipeline step a login failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    Exchange,
    Fetch,
    Reconcile,
    Resolve,
    Issue,
}

impl LoginStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginStage::Exchange => "exchange",
            LoginStage::Fetch => "fetch",
            LoginStage::Reconcile => "reconcile",
            LoginStage::Resolve => "resolve",
            LoginStage::Issue => "issue",
        }
    }
}

impl fmt::Display for LoginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum LoginErrorKind {
    #[error("network failure: {0}")]
    Network(String),

    #[error("unexpected provider response: {0}")]
    ResponseParse(String),

    #[error("provider returned an empty access token")]
    EmptyToken,

    #[error("provider profile is missing its external id")]
    InvalidProfile,

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("permission lookup failure: {0}")]
    PermissionLookup(String),

    #[error("token signing failure: {0}")]
    Signing(String),

    #[error("login cancelled: {0}")]
    Cancelled(&'static str),
}

impl LoginErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            LoginErrorKind::Network(_) => "network",
            LoginErrorKind::ResponseParse(_) => "response_parse",
            LoginErrorKind::EmptyToken => "empty_token",
            LoginErrorKind::InvalidProfile => "invalid_profile",
            LoginErrorKind::Persistence(_) => "persistence",
            LoginErrorKind::PermissionLookup(_) => "permission_lookup",
            LoginErrorKind::Signing(_) => "signing",
            LoginErrorKind::Cancelled(_) => "cancelled",
        }
    }
}

impl From<OAuthError> for LoginErrorKind {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::InvalidUrl(_) | OAuthError::InvalidRequest(_) | OAuthError::Network(_) => {
                LoginErrorKind::Network(err.to_string())
            },
            OAuthError::ResponseParse(msg) => LoginErrorKind::ResponseParse(msg),
            OAuthError::EmptyToken => LoginErrorKind::EmptyToken,
            OAuthError::InvalidProfile => LoginErrorKind::InvalidProfile,
        }
    }
}

impl From<JwtError> for LoginErrorKind {
    fn from(err: JwtError) -> Self {
        LoginErrorKind::Signing(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid login input")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("login failed at {stage}: {kind}")]
    Failed { stage: LoginStage, kind: LoginErrorKind },
}

impl LoginError {
    pub fn failed(stage: LoginStage, kind: impl Into<LoginErrorKind>) -> Self {
        LoginError::Failed { stage, kind: kind.into() }
    }

    /// Short code appended to the frontend login page on a failed callback.
    pub fn reason_code(&self) -> &'static str {
        match self {
            LoginError::InvalidInput(_) => "missing_code",
            LoginError::Failed { stage, kind } => match (stage, kind) {
                (_, LoginErrorKind::Cancelled(_)) => "login_failed",
                (LoginStage::Exchange, LoginErrorKind::EmptyToken) => "invalid_token",
                (LoginStage::Exchange, _) => "login_failed",
                (LoginStage::Fetch, LoginErrorKind::InvalidProfile) => "invalid_user",
                (LoginStage::Fetch, _) => "login_failed",
                (LoginStage::Reconcile, _) => "save_user_failed",
                (LoginStage::Resolve, _) => "permissions_failed",
                (LoginStage::Issue, _) => "token_failed",
            },
        }
    }
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidInput(errors) => AppError::Validation(errors),
            // Already logged with its stage by the orchestrator.
            LoginError::Failed { .. } => AppError::Internal,
        }
    }
}
