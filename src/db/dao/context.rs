use sea_orm::DatabaseConnection;

use super::{CartDao, CategoryDao, DaoBase, ListingDao, RatingDao, SeedFlagDao, UserDao};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn category(&self) -> CategoryDao {
        DaoBase::new(&self.db)
    }

    pub fn listing(&self) -> ListingDao {
        DaoBase::new(&self.db)
    }

    pub fn cart(&self) -> CartDao {
        DaoBase::new(&self.db)
    }

    pub fn rating(&self) -> RatingDao {
        DaoBase::new(&self.db)
    }

    pub fn seed_flag(&self) -> SeedFlagDao {
        DaoBase::new(&self.db)
    }
}
