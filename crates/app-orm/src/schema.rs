//! Builds the tables straight from the entity definitions.
//!
//! Meant for tests and local development; production databases are expected
//! to be migrated ahead of time.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};

use crate::prelude::{Permissions, RolePermissions, Roles, UserRoles, Users};

/// Creates every table that does not exist yet. Safe to call repeatedly.
pub async fn create_tables<C>(db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    // Referenced tables first.
    create_table(db, Users).await?;
    create_table(db, Roles).await?;
    create_table(db, Permissions).await?;
    create_table(db, RolePermissions).await?;
    create_table(db, UserRoles).await?;
    Ok(())
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut statement = Schema::new(backend).create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{ActiveValue, ConnectOptions, Database, DatabaseConnection, EntityTrait};

    use super::*;
    use crate::users;

    // One pooled connection, otherwise each connection opens its own empty database.
    async fn connect_memory() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        Database::connect(opt).await.unwrap()
    }

    fn user(id: i64, external_id: i64) -> users::ActiveModel {
        let now = Utc::now().fixed_offset();
        users::ActiveModel {
            id: ActiveValue::Set(id),
            external_id: ActiveValue::Set(external_id),
            email: ActiveValue::Set("a@b.com".to_string()),
            username: ActiveValue::Set("octocat".to_string()),
            avatar_url: ActiveValue::Set(String::new()),
            profile_url: ActiveValue::Set(String::new()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() {
        let db = connect_memory().await;

        create_tables(&db).await.unwrap();
        create_tables(&db).await.unwrap();

        assert!(Users::find().all(&db).await.unwrap().is_empty());
        assert!(Permissions::find().all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_external_id_is_unique() {
        let db = connect_memory().await;
        create_tables(&db).await.unwrap();

        Users::insert(user(1, 42)).exec(&db).await.unwrap();
        let duplicate = Users::insert(user(2, 42)).exec(&db).await;

        assert!(duplicate.is_err());
        assert_eq!(Users::find().all(&db).await.unwrap().len(), 1);
    }
}
