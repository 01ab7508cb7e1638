use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{prelude::User, user};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;
    const ENTITY_NAME: &'static str = "user";

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserDao {
    pub async fn find_by_id(&self, id: i64) -> DaoResult<user::Model> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Matches either column. Both are `COLLATE NOCASE`, so case never matters.
    pub async fn find_by_identifier(&self, identifier: &str) -> DaoResult<Option<user::Model>> {
        Ok(User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(identifier))
                    .add(user::Column::Email.eq(identifier)),
            )
            .one(&self.db)
            .await?)
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        Ok(User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    pub async fn username_or_email_taken(&self, username: &str, email: &str) -> DaoResult<bool> {
        let existing = User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .one(&self.db)
            .await?;
        Ok(existing.is_some())
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        display_name: Option<&str>,
    ) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            display_name: Set(display_name.map(str::to_string)),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model.insert(&self.db).await.map_err(DaoLayerError::Db)
    }

    pub async fn set_password_hash(&self, id: i64, password_hash: &str) -> DaoResult<()> {
        let result = User::update_many()
            .col_expr(
                user::Column::PasswordHash,
                sea_orm::sea_query::Expr::value(password_hash.to_string()),
            )
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::UserDao;
    use crate::db::{
        dao::{DaoBase, DaoLayerError},
        entities::user,
    };

    fn user_model(id: i64, username: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            email: format!("{username}@example.edu"),
            password_hash: "hash".to_string(),
            display_name: None,
            created_at: Utc
                .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
                .single()
                .expect("timestamp should be valid"),
        }
    }

    #[tokio::test]
    async fn find_by_identifier_returns_first_match() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([[user_model(3, "alice")]])
            .into_connection();
        let dao = UserDao::new(&db);

        let found = dao
            .find_by_identifier("ALICE")
            .await
            .expect("query should succeed");
        assert_eq!(found.map(|user| user.id), Some(3));
    }

    #[tokio::test]
    async fn find_by_id_reports_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao.find_by_id(9).await.expect_err("lookup should fail");
        assert!(matches!(
            err,
            DaoLayerError::NotFound { entity: "user", id: 9 }
        ));
    }

    #[tokio::test]
    async fn set_password_hash_requires_existing_row() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .set_password_hash(5, "new-hash")
            .await
            .expect_err("update should fail");
        assert!(matches!(err, DaoLayerError::NotFound { id: 5, .. }));
    }
}
