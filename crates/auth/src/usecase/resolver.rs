use std::sync::Arc;

use crate::domain::entity::permission::PermissionSet;
use crate::domain::error::LoginErrorKind;
use crate::outbound::repository::AuthRepository;

/// Read-only lookup of `user_roles -> role_permissions -> permissions`.
pub struct PermissionResolver {
    repo: Arc<dyn AuthRepository>,
}

impl PermissionResolver {
    pub fn new(repo: Arc<dyn AuthRepository>) -> Self {
        Self { repo }
    }

    pub async fn resolve(&self, user_id: i64) -> Result<PermissionSet, LoginErrorKind> {
        let names = self
            .repo
            .resolve_permissions(user_id)
            .await
            .map_err(|e| LoginErrorKind::PermissionLookup(e.to_string()))?;

        let permissions: PermissionSet = names.into_iter().collect();
        if permissions.is_empty() {
            tracing::debug!(user_id, "User holds no permissions");
        }

        Ok(permissions)
    }
}
