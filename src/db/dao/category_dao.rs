use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use super::{DaoBase, DaoResult};
use crate::db::entities::{category, prelude::Category};

#[derive(Clone)]
pub struct CategoryDao {
    db: DatabaseConnection,
}

impl DaoBase for CategoryDao {
    type Entity = Category;
    const ENTITY_NAME: &'static str = "category";

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl CategoryDao {
    /// Seed order, which is also the navigation order.
    pub async fn list_all(&self) -> DaoResult<Vec<category::Model>> {
        Ok(Category::find()
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn find_by_id(&self, id: i64) -> DaoResult<Option<category::Model>> {
        Ok(Category::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_by_slug(&self, slug: &str) -> DaoResult<Option<category::Model>> {
        Ok(Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?)
    }
}
