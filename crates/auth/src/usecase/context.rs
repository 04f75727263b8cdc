use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::error::LoginErrorKind;

/// Request-scoped state every login stage runs under.
#[derive(Debug, Clone)]
pub struct LoginContext {
    correlation_id: String,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl LoginContext {
    pub fn new(correlation_id: impl Into<String>, cancel: CancellationToken) -> Self {
        Self { correlation_id: correlation_id.into(), cancel, deadline: None }
    }

    /// Bounds the whole login, starting now. `None` leaves it unbounded.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.deadline = timeout.map(|t| Instant::now() + t);
        self
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Fails once the context is cancelled or past its deadline.
    pub fn checkpoint(&self) -> Result<(), LoginErrorKind> {
        if self.cancel.is_cancelled() {
            return Err(LoginErrorKind::Cancelled("shutdown"));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(LoginErrorKind::Cancelled("deadline exceeded"));
        }
        Ok(())
    }

    /// Drives `fut` unless cancellation or the deadline wins first, in which
    /// case `fut` is dropped mid-flight.
    pub async fn race<F, T>(&self, fut: F) -> Result<T, LoginErrorKind>
    where
        F: Future<Output = Result<T, LoginErrorKind>>,
    {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(LoginErrorKind::Cancelled("shutdown")),
            _ = deadline => Err(LoginErrorKind::Cancelled("deadline exceeded")),
            result = fut => result,
        }
    }
}
