mod domain;
mod inbound;
mod outbound;
mod usecase;

use std::sync::Arc;

use app_core::config::Config;
use app_core::jwt::TokenManager;
use app_core::oauth::OAuthClient;
use app_core::uid::Generator;
pub use inbound::router::create_router;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;

use crate::inbound::state::AuthState;
use crate::outbound::orm::AuthORM;
use crate::usecase::issuer::TokenIssuer;
use crate::usecase::login::LoginService;
use crate::usecase::reconciler::UserReconciler;
use crate::usecase::resolver::PermissionResolver;

pub struct Dependency {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<Config>,
    pub uid: Arc<dyn Generator>,
    pub token: Arc<dyn TokenManager>,
    pub oauth: Arc<OAuthClient>,
    pub shutdown: CancellationToken,
}

pub fn new(dep: Dependency) -> AuthState {
    let repo = Arc::new(AuthORM::new(dep.db));

    let login_svc = Arc::new(LoginService::new(
        dep.oauth.clone(),
        dep.oauth,
        UserReconciler::new(repo.clone(), dep.uid),
        PermissionResolver::new(repo),
        TokenIssuer::new(dep.token),
    ));

    AuthState::new(dep.config, dep.shutdown, login_svc)
}
