use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
    sea_query::{Expr, ExprTrait, Func, OnConflict, Query},
};

use serde::Serialize;

use super::{DaoBase, DaoResult};
use crate::db::entities::{
    ListingStatus,
    cart_item::{self, Entity as CartItem},
    listing::{self, Entity as Listing},
};

/// A cart row together with the listing it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub item: cart_item::Model,
    pub listing: listing::Model,
}

#[derive(Clone)]
pub struct CartDao {
    db: DatabaseConnection,
}

impl DaoBase for CartDao {
    type Entity = CartItem;
    const ENTITY_NAME: &'static str = "cart item";

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl CartDao {
    pub async fn quantity_in<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        listing_id: i64,
    ) -> DaoResult<Option<i32>> {
        Ok(CartItem::find_by_id((user_id, listing_id))
            .one(conn)
            .await?
            .map(|item| item.quantity))
    }

    /// Single upsert: a new row gets `qty`, an existing row gets `quantity + qty`.
    pub async fn upsert_in<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        listing_id: i64,
        qty: i32,
    ) -> DaoResult<()> {
        let item = cart_item::ActiveModel {
            user_id: Set(user_id),
            listing_id: Set(listing_id),
            quantity: Set(qty),
            added_at: Set(Utc::now()),
        };

        CartItem::insert(item)
            .on_conflict(
                OnConflict::columns([cart_item::Column::UserId, cart_item::Column::ListingId])
                    .value(
                        cart_item::Column::Quantity,
                        Expr::col((CartItem, cart_item::Column::Quantity)).add(qty),
                    )
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    pub async fn remove(&self, user_id: i64, listing_id: i64) -> DaoResult<u64> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ListingId.eq(listing_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Deletes the user's rows whose listing is no longer active.
    pub async fn purge_inactive_in<C: ConnectionTrait>(conn: &C, user_id: i64) -> DaoResult<u64> {
        let inactive = Query::select()
            .column(listing::Column::Id)
            .from(Listing)
            .and_where(Expr::col(listing::Column::Status).ne(ListingStatus::Active.as_str()))
            .to_owned();

        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ListingId.in_subquery(inactive))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Most recently added first. Rows whose listing vanished are skipped.
    pub async fn lines_in<C: ConnectionTrait>(conn: &C, user_id: i64) -> DaoResult<Vec<CartLine>> {
        let rows = CartItem::find()
            .find_also_related(Listing)
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_desc(cart_item::Column::AddedAt)
            .order_by_desc(cart_item::Column::ListingId)
            .all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(item, listing)| listing.map(|listing| CartLine { item, listing }))
            .collect())
    }

    pub async fn lines(&self, user_id: i64) -> DaoResult<Vec<CartLine>> {
        Self::lines_in(&self.db, user_id).await
    }

    /// Sum of quantities over items whose listing is still active. Read only.
    pub async fn active_quantity(&self, user_id: i64) -> DaoResult<i64> {
        let total = CartItem::find()
            .select_only()
            .column_as(
                Expr::expr(Func::sum(Expr::col((CartItem, cart_item::Column::Quantity)))),
                "total",
            )
            .join(JoinType::InnerJoin, cart_item::Relation::Listing.def())
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(listing::Column::Status.eq(ListingStatus::Active.as_str()))
            .into_tuple::<Option<i64>>()
            .one(&self.db)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }
}
