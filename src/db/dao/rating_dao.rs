use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    sea_query::{Expr, Func},
};
use serde::Serialize;

use super::{DaoBase, DaoResult};
use crate::db::entities::{
    NewSellerRating,
    seller_rating::{self, Entity as SellerRating},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    /// Rounded to one decimal place; `None` when nobody has rated yet.
    pub average: Option<f64>,
    pub count: u64,
}

#[derive(Clone)]
pub struct RatingDao {
    db: DatabaseConnection,
}

impl DaoBase for RatingDao {
    type Entity = SellerRating;
    const ENTITY_NAME: &'static str = "seller rating";

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl RatingDao {
    pub async fn summary_for(&self, ratee_id: i64) -> DaoResult<RatingSummary> {
        let row = SellerRating::find()
            .select_only()
            .column_as(
                Expr::expr(Func::avg(Expr::col((SellerRating, seller_rating::Column::Score)))),
                "average",
            )
            .column_as(
                Expr::expr(Func::count(Expr::col((SellerRating, seller_rating::Column::Id)))),
                "count",
            )
            .filter(seller_rating::Column::RateeId.eq(ratee_id))
            .into_tuple::<(Option<f64>, i64)>()
            .one(&self.db)
            .await?;

        let (average, count) = row.unwrap_or((None, 0));
        Ok(RatingSummary {
            average: average.map(|avg| (avg * 10.0).round() / 10.0),
            count: count.max(0) as u64,
        })
    }

    /// Raw insert for a validated rating. No user-facing flow calls this yet.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        rating: NewSellerRating,
    ) -> DaoResult<()> {
        SellerRating::insert(rating.into_active_model())
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }
}
