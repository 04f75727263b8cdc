use std::sync::Arc;

use app_core::oauth::{CodeExchanger, ProfileFetcher};
use async_trait::async_trait;
use oauth2::AuthorizationCode;
use validator::Validate;

use super::context::LoginContext;
use super::issuer::TokenIssuer;
use super::reconciler::UserReconciler;
use super::resolver::PermissionResolver;
use crate::domain::error::{LoginError, LoginErrorKind, LoginStage};
use crate::domain::inout::prelude::*;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginUseCase: Send + Sync {
    async fn login(&self, ctx: &LoginContext, input: LoginInput) -> Result<LoginOutput, LoginError>;
}

/// Runs exchange, fetch, reconcile, resolve and issue in order, stopping at
/// the first failure.
pub struct LoginService {
    exchanger: Arc<dyn CodeExchanger>,
    fetcher: Arc<dyn ProfileFetcher>,
    reconciler: UserReconciler,
    resolver: PermissionResolver,
    issuer: TokenIssuer,
}

impl LoginService {
    pub fn new(
        exchanger: Arc<dyn CodeExchanger>,
        fetcher: Arc<dyn ProfileFetcher>,
        reconciler: UserReconciler,
        resolver: PermissionResolver,
        issuer: TokenIssuer,
    ) -> Self {
        Self { exchanger, fetcher, reconciler, resolver, issuer }
    }

    async fn run(&self, ctx: &LoginContext, code: &AuthorizationCode) -> Result<LoginOutput, LoginError> {
        ctx.checkpoint().map_err(at(LoginStage::Exchange))?;
        let access_token = ctx
            .race(async { self.exchanger.exchange_code(code).await.map_err(LoginErrorKind::from) })
            .await
            .map_err(at(LoginStage::Exchange))?;

        ctx.checkpoint().map_err(at(LoginStage::Fetch))?;
        let profile = ctx
            .race(async { self.fetcher.fetch_profile(&access_token).await.map_err(LoginErrorKind::from) })
            .await
            .map_err(at(LoginStage::Fetch))?;

        // Storage stages run to completion; cancellation is only observed between them.
        ctx.checkpoint().map_err(at(LoginStage::Reconcile))?;
        let user = self.reconciler.reconcile(&profile).await.map_err(at(LoginStage::Reconcile))?;

        ctx.checkpoint().map_err(at(LoginStage::Resolve))?;
        let permissions = self.resolver.resolve(user.id).await.map_err(at(LoginStage::Resolve))?;

        ctx.checkpoint().map_err(at(LoginStage::Issue))?;
        let token = self.issuer.issue(&user, &permissions).map_err(at(LoginStage::Issue))?;

        tracing::info!(
            _cID = ctx.correlation_id(),
            user_id = user.id,
            external_id = user.external_id,
            permissions = permissions.len(),
            "Login succeeded"
        );

        Ok(LoginOutput { user, permissions, token })
    }
}

fn at(stage: LoginStage) -> impl Fn(LoginErrorKind) -> LoginError {
    move |kind| LoginError::failed(stage, kind)
}

#[async_trait]
impl LoginUseCase for LoginService {
    async fn login(&self, ctx: &LoginContext, input: LoginInput) -> Result<LoginOutput, LoginError> {
        input.validate()?;
        let code = AuthorizationCode::new(input.code.trim().to_string());

        let result = self.run(ctx, &code).await;
        if let Err(LoginError::Failed { stage, kind }) = &result {
            tracing::error!(
                _cID = ctx.correlation_id(),
                stage = %stage,
                kind = kind.name(),
                error = %kind,
                "Login failed"
            );
        }

        result
    }
}
