use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    auth::Identity,
    db::{
        dao::{
            CategoryDao, DaoBase, DaoLayerError, ListingDao, ListingQuery, ListingSearch, NewListing,
            PaginatedResponse, PriceBand,
        },
        entities::{ListingStatus, category, listing},
    },
    error::AppError,
};

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_DESCRIPTION_CHARS: usize = 2_000;
pub const MAX_PRICE_CENTS: i64 = 100_000_000;
pub const DEFAULT_PAGE_SIZE: u64 = 24;
pub const DEALS_PER_BAND: u64 = 6;

const LISTING_NOT_FOUND: &str = "Listing not found";

/// Seller input for a new listing, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: i64,
    pub price_cents: i64,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DealBucket {
    pub band: PriceBand,
    pub label: &'static str,
    pub listings: Vec<listing::Model>,
}

#[derive(Clone)]
pub struct CatalogService {
    listings: ListingDao,
    categories: CategoryDao,
}

impl CatalogService {
    pub fn new(listings: ListingDao, categories: CategoryDao) -> Self {
        Self {
            listings,
            categories,
        }
    }

    pub async fn create_listing(
        &self,
        owner: &Identity,
        draft: ListingDraft,
    ) -> Result<listing::Model, AppError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Title is required"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::validation(format!(
                "Title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }

        let description = draft.description.trim();
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(AppError::validation(format!(
                "Description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }

        if draft.price_cents <= 0 {
            return Err(AppError::validation("Price must be greater than zero"));
        }
        if draft.price_cents > MAX_PRICE_CENTS {
            return Err(AppError::validation("Price is too high"));
        }

        if self.categories.find_by_id(draft.category_id).await?.is_none() {
            return Err(AppError::validation("Unknown category"));
        }

        let listing = self
            .listings
            .create_listing(NewListing {
                owner_id: owner.user_id,
                category_id: draft.category_id,
                title: title.to_string(),
                description: description.to_string(),
                price_cents: draft.price_cents,
                condition: non_blank(draft.condition),
                color: non_blank(draft.color),
            })
            .await?;

        info!(listing_id = listing.id, owner_id = owner.user_id, "listing created");
        Ok(listing)
    }

    /// Cursor over matching active listings, newest first.
    pub fn search(&self, query: ListingQuery) -> ListingSearch {
        self.listings.search(query, DEFAULT_PAGE_SIZE)
    }

    pub async fn search_page(
        &self,
        query: &ListingQuery,
        page: u64,
    ) -> Result<PaginatedResponse<listing::Model>, AppError> {
        Ok(self
            .listings
            .search_page(query, page, DEFAULT_PAGE_SIZE)
            .await?)
    }

    /// Removed listings are only visible to their owner.
    pub async fn get_listing(
        &self,
        id: i64,
        viewer: Option<&Identity>,
    ) -> Result<listing::Model, AppError> {
        let listing = match self.listings.find_by_id(id).await {
            Ok(listing) => listing,
            Err(DaoLayerError::NotFound { .. }) => {
                return Err(AppError::not_found(LISTING_NOT_FOUND));
            }
            Err(err) => return Err(err.into()),
        };

        if listing.status() == Some(ListingStatus::Removed)
            && !viewer.is_some_and(|viewer| viewer.owns(listing.owner_id))
        {
            return Err(AppError::not_found(LISTING_NOT_FOUND));
        }
        Ok(listing)
    }

    pub async fn update_status(
        &self,
        owner: &Identity,
        id: i64,
        next: ListingStatus,
    ) -> Result<listing::Model, AppError> {
        let txn = self.listings.db().begin().await?;
        match transition_in(&txn, owner, id, next).await {
            Ok((from, updated)) => {
                txn.commit().await?;
                info!(listing_id = id, from = %from, to = %next, "listing status changed");
                Ok(updated)
            }
            Err(err) => {
                txn.rollback().await?;
                Err(err)
            }
        }
    }

    pub async fn list_categories(&self) -> Result<Vec<category::Model>, AppError> {
        Ok(self.categories.list_all().await?)
    }

    pub async fn find_category_by_slug(&self, slug: &str) -> Result<category::Model, AppError> {
        self.categories
            .find_by_slug(slug.trim())
            .await?
            .ok_or_else(|| AppError::not_found("Category not found"))
    }

    pub async fn category_listings(
        &self,
        slug: &str,
        page: u64,
    ) -> Result<(category::Model, PaginatedResponse<listing::Model>), AppError> {
        let category = self.find_category_by_slug(slug).await?;
        let query = ListingQuery::default().in_category(category.id);
        let listings = self.search_page(&query, page).await?;
        Ok((category, listings))
    }

    pub async fn best_deals(&self) -> Result<Vec<DealBucket>, AppError> {
        let mut buckets = Vec::with_capacity(PriceBand::ALL.len());
        for band in PriceBand::ALL {
            buckets.push(DealBucket {
                band,
                label: band.label(),
                listings: self.listings.cheapest_in_band(band, DEALS_PER_BAND).await?,
            });
        }
        Ok(buckets)
    }
}

async fn transition_in<C: ConnectionTrait>(
    conn: &C,
    owner: &Identity,
    id: i64,
    next: ListingStatus,
) -> Result<(ListingStatus, listing::Model), AppError> {
    let Some(current) = ListingDao::find_in(conn, id).await? else {
        return Err(AppError::not_found(LISTING_NOT_FOUND));
    };
    let status = current.status().ok_or_else(|| {
        tracing::error!(listing_id = id, status = %current.status, "unknown listing status");
        AppError::internal()
    })?;

    if !owner.owns(current.owner_id) {
        if status == ListingStatus::Removed {
            return Err(AppError::not_found(LISTING_NOT_FOUND));
        }
        return Err(AppError::forbidden("You do not own this listing"));
    }

    if !status.can_transition_to(next) {
        return Err(AppError::invalid_transition(format!(
            "Cannot change a {status} listing to {next}"
        )));
    }

    // Someone else may have moved it since the read above.
    if !ListingDao::compare_and_set_status_in(conn, id, status, next).await? {
        return Err(AppError::invalid_transition(
            "Listing status changed concurrently",
        ));
    }

    let updated = ListingDao::find_in(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(LISTING_NOT_FOUND))?;
    Ok((status, updated))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
