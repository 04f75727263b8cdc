use std::sync::Arc;
use std::time::Duration;

use app_core::config::Config;
use app_core::middleware::CorrelationId;
use tokio_util::sync::CancellationToken;

use crate::usecase::context::LoginContext;
use crate::usecase::login::LoginUseCase;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<Config>,
    pub shutdown: CancellationToken,
    pub login: Arc<dyn LoginUseCase>,
}

impl AuthState {
    pub fn new(config: Arc<Config>, shutdown: CancellationToken, login: Arc<dyn LoginUseCase>) -> Self {
        Self { config, shutdown, login }
    }

    /// Read per request so a config reload takes effect without a restart.
    ///
    /// Falls back to the local development frontend, never to a deployed one.
    pub fn frontend_url(&self) -> String {
        let url = self.config.get::<String>("app.frontend_url").unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                default = DEFAULT_FRONTEND_URL,
                "app.frontend_url is not usable, redirecting to the local frontend"
            );
            DEFAULT_FRONTEND_URL.to_string()
        });
        url.trim_end_matches('/').to_string()
    }

    /// A login context tied to server shutdown and bounded by `auth.login_timeout_secs`.
    ///
    /// A timeout of zero disables the deadline.
    pub fn login_context(&self, c_id: CorrelationId) -> LoginContext {
        let timeout_secs = self.config.get_or::<u64>("auth.login_timeout_secs", 0).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Invalid auth.login_timeout_secs, login runs without a deadline");
            0
        });
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        LoginContext::new(c_id.0, self.shutdown.child_token()).with_timeout(timeout)
    }
}
