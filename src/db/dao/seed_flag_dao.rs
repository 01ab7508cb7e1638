use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, QueryOrder};

use super::{DaoBase, DaoResult};
use crate::db::entities::{prelude::SeedFlag, seed_flag};

#[derive(Clone)]
pub struct SeedFlagDao {
    db: DatabaseConnection,
}

impl DaoBase for SeedFlagDao {
    type Entity = SeedFlag;
    const ENTITY_NAME: &'static str = "seed flag";

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl SeedFlagDao {
    pub async fn list(&self) -> DaoResult<Vec<seed_flag::Model>> {
        Ok(SeedFlag::find()
            .order_by_asc(seed_flag::Column::AppliedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn is_applied_in<C: ConnectionTrait>(conn: &C, name: &str) -> DaoResult<bool> {
        Ok(SeedFlag::find_by_id(name.to_string())
            .one(conn)
            .await?
            .is_some())
    }

    /// Inserts the flag. Fails with a unique violation if another run got there first.
    pub async fn mark_applied_in<C: ConnectionTrait>(conn: &C, name: &str) -> DaoResult<()> {
        let flag = seed_flag::ActiveModel {
            name: sea_orm::Set(name.to_string()),
            applied_at: sea_orm::Set(chrono::Utc::now()),
        };
        SeedFlag::insert(flag).exec_without_returning(conn).await?;
        Ok(())
    }
}
