use std::sync::Arc;

use app_core::oauth::ExternalProfile;
use app_core::uid::Generator;
use chrono::Utc;
use sea_orm::DbErr;

use crate::domain::entity::user::{NewUser, User, UserRefresh};
use crate::domain::error::LoginErrorKind;
use crate::outbound::repository::AuthRepository;

/// Upserts the local user behind a provider profile, keyed by external id.
pub struct UserReconciler {
    repo: Arc<dyn AuthRepository>,
    uid: Arc<dyn Generator>,
}

impl UserReconciler {
    pub fn new(repo: Arc<dyn AuthRepository>, uid: Arc<dyn Generator>) -> Self {
        Self { repo, uid }
    }

    pub async fn reconcile(&self, profile: &ExternalProfile) -> Result<User, LoginErrorKind> {
        let refresh = UserRefresh {
            external_id: profile.external_id,
            email: profile.email.clone(),
            profile_url: profile.profile_url.clone(),
        };

        if let Some(existing) = self.repo.find_user_by_external_id(profile.external_id).await.map_err(persistence)? {
            self.refresh(&refresh).await?;
            return Ok(User {
                email: refresh.email,
                profile_url: refresh.profile_url,
                updated_at: Utc::now(),
                ..existing
            });
        }

        let new_user = NewUser {
            id: self.uid.generate().map_err(|e| LoginErrorKind::Persistence(e.to_string()))?,
            external_id: profile.external_id,
            email: profile.email.clone(),
            username: profile.username().to_string(),
            avatar_url: profile.avatar_url.clone(),
            profile_url: profile.profile_url.clone(),
        };

        if !self.repo.create_user(&new_user).await.map_err(persistence)? {
            tracing::debug!(external_id = profile.external_id, "User was created concurrently, refreshing it instead");
            self.refresh(&refresh).await?;
        }

        self.repo
            .find_user_by_external_id(profile.external_id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| LoginErrorKind::Persistence(format!("user {} missing after upsert", profile.external_id)))
    }

    async fn refresh(&self, refresh: &UserRefresh) -> Result<(), LoginErrorKind> {
        match self.repo.update_user(refresh).await.map_err(persistence)? {
            0 => Err(LoginErrorKind::Persistence(format!("user {} disappeared during update", refresh.external_id))),
            _ => Ok(()),
        }
    }
}

fn persistence(err: DbErr) -> LoginErrorKind {
    LoginErrorKind::Persistence(err.to_string())
}
