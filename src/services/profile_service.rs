use serde::Serialize;

use crate::{
    auth::Identity,
    db::{
        dao::{CartDao, ListingDao, RatingDao, RatingSummary, UserDao},
        entities::{ListingStatus, listing},
    },
    error::AppError,
};

pub const RECENT_LISTINGS: u64 = 6;
pub const NO_RATINGS_LABEL: &str = "no ratings yet";

#[derive(Debug, Clone, Serialize)]
pub struct ProfileStats {
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub active_listings: u64,
    pub sold_listings: u64,
    pub total_listings: u64,
    pub cart_item_count: i64,
    pub rating: RatingSummary,
    pub rating_label: String,
    pub recent_listings: Vec<listing::Model>,
}

#[derive(Clone)]
pub struct ProfileService {
    users: UserDao,
    listings: ListingDao,
    cart: CartDao,
    ratings: RatingDao,
}

impl ProfileService {
    pub fn new(users: UserDao, listings: ListingDao, cart: CartDao, ratings: RatingDao) -> Self {
        Self {
            users,
            listings,
            cart,
            ratings,
        }
    }

    /// Read-only. Zero listings and zero ratings are ordinary results.
    pub async fn get_profile_stats(&self, user: &Identity) -> Result<ProfileStats, AppError> {
        let account = self.users.find_by_id(user.user_id).await?;

        let active_listings = self
            .listings
            .count_by_owner(user.user_id, Some(ListingStatus::Active))
            .await?;
        let sold_listings = self
            .listings
            .count_by_owner(user.user_id, Some(ListingStatus::Sold))
            .await?;
        let total_listings = self.listings.count_by_owner(user.user_id, None).await?;
        let cart_item_count = self.cart.active_quantity(user.user_id).await?;
        let rating = self.ratings.summary_for(user.user_id).await?;
        let recent_listings = self
            .listings
            .recent_by_owner(user.user_id, RECENT_LISTINGS)
            .await?;

        Ok(ProfileStats {
            user_id: account.id,
            display_name: account.display_name().to_string(),
            username: account.username,
            active_listings,
            sold_listings,
            total_listings,
            cart_item_count,
            rating_label: rating_label(&rating),
            rating,
            recent_listings,
        })
    }
}

fn rating_label(rating: &RatingSummary) -> String {
    match rating.average {
        Some(average) if rating.count > 0 => format!("{average:.1} / 5 ({} ratings)", rating.count),
        _ => NO_RATINGS_LABEL.to_string(),
    }
}
