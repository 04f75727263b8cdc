use async_trait::async_trait;
use sea_orm::DbErr;

use crate::domain::entity::user::{NewUser, User, UserRefresh};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_external_id(&self, external_id: i64) -> Result<Option<User>, DbErr>;

    /// Inserts the user unless one with the same external id already exists.
    ///
    /// Returns `false` when the row was left untouched because of that conflict.
    async fn create_user(&self, user: &NewUser) -> Result<bool, DbErr>;

    /// Returns the number of rows touched, zero when no user has that external id.
    async fn update_user(&self, refresh: &UserRefresh) -> Result<u64, DbErr>;

    /// Permission names granted through the user's roles, without duplicates.
    async fn resolve_permissions(&self, user_id: i64) -> Result<Vec<String>, DbErr>;
}
