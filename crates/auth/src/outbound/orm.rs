use std::sync::Arc;

use app_orm::prelude::{Permissions, RolePermissions, UserRoles, Users};
use app_orm::{permissions, role_permissions, user_roles, users};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use super::repository::AuthRepository;
use crate::domain::entity::user::{NewUser, User, UserRefresh};

/// SeaORM-backed [`AuthRepository`].
///
/// Every method is a single statement, so none of them needs a transaction;
/// the unique index on `users.external_id` is what keeps concurrent first
/// logins from creating duplicate rows.
pub struct AuthORM {
    db: Arc<DatabaseConnection>,
}

impl AuthORM {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn to_user(&self, model: users::Model) -> User {
        User {
            id: model.id,
            external_id: model.external_id,
            email: model.email,
            username: model.username,
            avatar_url: model.avatar_url,
            profile_url: model.profile_url,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

#[async_trait]
impl AuthRepository for AuthORM {
    async fn find_user_by_external_id(&self, external_id: i64) -> Result<Option<User>, DbErr> {
        let user = Users::find().filter(users::Column::ExternalId.eq(external_id)).one(self.db.as_ref()).await?;

        Ok(user.map(|u| self.to_user(u)))
    }

    async fn create_user(&self, user: &NewUser) -> Result<bool, DbErr> {
        let now = Utc::now().fixed_offset();
        let model = users::ActiveModel {
            id: ActiveValue::Set(user.id),
            external_id: ActiveValue::Set(user.external_id),
            email: ActiveValue::Set(user.email.clone()),
            username: ActiveValue::Set(user.username.clone()),
            avatar_url: ActiveValue::Set(user.avatar_url.clone()),
            profile_url: ActiveValue::Set(user.profile_url.clone()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        let inserted = Users::insert(model)
            .on_conflict(OnConflict::column(users::Column::ExternalId).do_nothing().to_owned())
            .exec_without_returning(self.db.as_ref())
            .await?;

        Ok(inserted > 0)
    }

    async fn update_user(&self, refresh: &UserRefresh) -> Result<u64, DbErr> {
        let result = Users::update_many()
            .col_expr(users::Column::Email, Expr::value(refresh.email.clone()))
            .col_expr(users::Column::ProfileUrl, Expr::value(refresh.profile_url.clone()))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(users::Column::ExternalId.eq(refresh.external_id))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn resolve_permissions(&self, user_id: i64) -> Result<Vec<String>, DbErr> {
        let role_ids: Vec<i64> = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|m| m.role_id)
            .collect();

        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let permission_ids: Vec<i64> = RolePermissions::find()
            .filter(role_permissions::Column::RoleId.is_in(role_ids))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|m| m.permission_id)
            .collect();

        if permission_ids.is_empty() {
            return Ok(Vec::new());
        }

        let names = Permissions::find()
            .filter(permissions::Column::Id.is_in(permission_ids))
            .order_by_asc(permissions::Column::Name)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|m| m.name)
            .collect();

        Ok(names)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use app_orm::prelude::Roles;
    use app_orm::{roles, schema};
    use sea_orm::{ConnectOptions, Database};

    use super::*;

    /// In-memory SQLite with the full schema. A single pooled connection keeps
    /// every query on the same database.
    pub(crate) async fn memory_db() -> Arc<DatabaseConnection> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        schema::create_tables(&db).await.unwrap();
        Arc::new(db)
    }

    fn new_user(id: i64, external_id: i64, email: &str) -> NewUser {
        NewUser {
            id,
            external_id,
            email: email.to_string(),
            username: "The Octocat".to_string(),
            avatar_url: "https://avatars.example.com/u/42".to_string(),
            profile_url: "https://github.com/octocat".to_string(),
        }
    }

    pub(crate) async fn seed_grants(db: &DatabaseConnection, user_id: i64) {
        Roles::insert_many([
            roles::ActiveModel { id: ActiveValue::Set(1), name: ActiveValue::Set("admin".into()) },
            roles::ActiveModel { id: ActiveValue::Set(2), name: ActiveValue::Set("editor".into()) },
        ])
        .exec_without_returning(db)
        .await
        .unwrap();

        Permissions::insert_many([
            permissions::ActiveModel { id: ActiveValue::Set(10), name: ActiveValue::Set("event:read".into()) },
            permissions::ActiveModel { id: ActiveValue::Set(11), name: ActiveValue::Set("article:write".into()) },
            permissions::ActiveModel { id: ActiveValue::Set(12), name: ActiveValue::Set("user:delete".into()) },
        ])
        .exec_without_returning(db)
        .await
        .unwrap();

        // Both roles grant article:write; user:delete belongs to no role the user holds.
        RolePermissions::insert_many([
            role_permissions::ActiveModel { role_id: ActiveValue::Set(1), permission_id: ActiveValue::Set(10) },
            role_permissions::ActiveModel { role_id: ActiveValue::Set(1), permission_id: ActiveValue::Set(11) },
            role_permissions::ActiveModel { role_id: ActiveValue::Set(2), permission_id: ActiveValue::Set(11) },
        ])
        .exec_without_returning(db)
        .await
        .unwrap();

        UserRoles::insert_many([
            user_roles::ActiveModel { user_id: ActiveValue::Set(user_id), role_id: ActiveValue::Set(1) },
            user_roles::ActiveModel { user_id: ActiveValue::Set(user_id), role_id: ActiveValue::Set(2) },
        ])
        .exec_without_returning(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = AuthORM::new(memory_db().await);

        assert!(repo.find_user_by_external_id(42).await.unwrap().is_none());
        assert!(repo.create_user(&new_user(1001, 42, "a@b.com")).await.unwrap());

        let user = repo.find_user_by_external_id(42).await.unwrap().unwrap();
        assert_eq!(user.id, 1001);
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.username, "The Octocat");
    }

    #[tokio::test]
    async fn test_create_user_conflict_keeps_first_row() {
        let repo = AuthORM::new(memory_db().await);

        assert!(repo.create_user(&new_user(1001, 42, "a@b.com")).await.unwrap());
        assert!(!repo.create_user(&new_user(1002, 42, "other@b.com")).await.unwrap());

        let user = repo.find_user_by_external_id(42).await.unwrap().unwrap();
        assert_eq!(user.id, 1001);
        assert_eq!(user.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_update_user_refreshes_provider_fields_only() {
        let repo = AuthORM::new(memory_db().await);
        repo.create_user(&new_user(1001, 42, "a@b.com")).await.unwrap();

        let touched = repo
            .update_user(&UserRefresh {
                external_id: 42,
                email: "new@b.com".to_string(),
                profile_url: "https://github.com/octo".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(touched, 1);
        let user = repo.find_user_by_external_id(42).await.unwrap().unwrap();
        assert_eq!(user.id, 1001);
        assert_eq!(user.email, "new@b.com");
        assert_eq!(user.profile_url, "https://github.com/octo");
        assert_eq!(user.username, "The Octocat");
        assert_eq!(user.avatar_url, "https://avatars.example.com/u/42");
    }

    #[tokio::test]
    async fn test_update_unknown_user_touches_nothing() {
        let repo = AuthORM::new(memory_db().await);

        let refresh = UserRefresh { external_id: 7, email: "x@y.z".to_string(), profile_url: String::new() };

        assert_eq!(repo.update_user(&refresh).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_resolve_permissions_through_roles() {
        let db = memory_db().await;
        let repo = AuthORM::new(db.clone());
        repo.create_user(&new_user(1001, 42, "a@b.com")).await.unwrap();
        seed_grants(&db, 1001).await;

        let permissions = repo.resolve_permissions(1001).await.unwrap();

        assert_eq!(permissions, vec!["article:write", "event:read"]);
    }

    #[tokio::test]
    async fn test_resolve_permissions_without_roles() {
        let repo = AuthORM::new(memory_db().await);

        assert!(repo.resolve_permissions(1001).await.unwrap().is_empty());
    }
}
