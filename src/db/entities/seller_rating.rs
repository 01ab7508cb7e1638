use chrono::Utc;
use sea_orm::{Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;

/// Seller feedback. Nothing writes ratings yet, but the table and its
/// constraints are live: score in 1..=5, no self-rating, one rating per
/// (rater, listing).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "seller_ratings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub rater_id: i64,
    pub ratee_id: i64,
    pub listing_id: i64,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RaterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Rater,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RateeId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Ratee,
    #[sea_orm(
        belongs_to = "super::listing::Entity",
        from = "Column::ListingId",
        to = "super::listing::Column::Id",
        on_delete = "Cascade"
    )]
    Listing,
}

impl Related<super::listing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listing.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Validated input for a rating row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSellerRating {
    rater_id: i64,
    ratee_id: i64,
    listing_id: i64,
    score: i32,
    comment: Option<String>,
}

impl NewSellerRating {
    pub fn new(
        rater_id: i64,
        ratee_id: i64,
        listing_id: i64,
        score: i32,
        comment: Option<String>,
    ) -> Result<Self, AppError> {
        if rater_id == ratee_id {
            return Err(AppError::validation("Sellers cannot rate themselves"));
        }
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(AppError::validation(format!(
                "Rating must be between {MIN_SCORE} and {MAX_SCORE}"
            )));
        }
        let comment = comment
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        Ok(Self {
            rater_id,
            ratee_id,
            listing_id,
            score,
            comment,
        })
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            rater_id: Set(self.rater_id),
            ratee_id: Set(self.ratee_id),
            listing_id: Set(self.listing_id),
            score: Set(self.score),
            comment: Set(self.comment),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
    }
}
