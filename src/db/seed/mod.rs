//! Apply-once seeding guarded by the `seed_flags` table.
//!
//! Each seed runs inside one transaction together with the insert of its
//! flag row, so a seed either lands completely (rows and flag) or not at all.

pub mod data;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::SeedConfig,
    db::{
        dao::{DaoLayerError, SeedFlagDao, is_unique_violation},
        entities::{ListingStatus, category, listing, user},
    },
};

use data::{
    CATEGORIES, DEMO_LISTINGS, DEMO_SELLER_DISPLAY_NAME, DEMO_SELLER_EMAIL,
    DEMO_SELLER_USERNAME, UNUSABLE_PASSWORD_HASH,
};

pub const CATEGORIES_SEED: &str = "categories_v1";
pub const DEMO_SELLER_SEED: &str = "seed_user1_v1";
pub const DEMO_LISTINGS_SEED: &str = "products_seed_v3";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed `{seed}` requires {missing}")]
    MissingPrerequisite { seed: String, missing: String },
    #[error("seed `{seed}` failed: {reason}")]
    Failed { seed: String, reason: String },
    #[error("database error during seeding: {0}")]
    Db(#[from] DbErr),
    #[error(transparent)]
    Dao(#[from] DaoLayerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Applied,
    AlreadyApplied,
}

/// A named, one-shot dataset. `run` receives the seed's transaction and must
/// do all of its writes through it.
#[async_trait]
pub trait Seed: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, txn: &DatabaseTransaction) -> Result<(), SeedError>;
}

#[derive(Clone)]
pub struct SeedLoader {
    db: DatabaseConnection,
}

impl SeedLoader {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub async fn apply_seed(&self, seed: &dyn Seed) -> Result<SeedOutcome, SeedError> {
        let name = seed.name();
        let txn = self.db.begin().await?;

        if SeedFlagDao::is_applied_in(&txn, name).await? {
            txn.rollback().await?;
            info!(seed = name, "seed already applied, skipping");
            return Ok(SeedOutcome::AlreadyApplied);
        }

        if let Err(err) = seed.run(&txn).await {
            txn.rollback().await?;
            warn!(seed = name, error = %err, "seed failed, rolled back");
            return Err(err);
        }

        match SeedFlagDao::mark_applied_in(&txn, name).await {
            Ok(()) => {}
            Err(DaoLayerError::Db(err)) if is_unique_violation(&err) => {
                txn.rollback().await?;
                info!(seed = name, "seed applied concurrently, discarding this run");
                return Ok(SeedOutcome::AlreadyApplied);
            }
            Err(err) => return Err(err.into()),
        }

        txn.commit().await?;
        info!(seed = name, "seed applied");
        Ok(SeedOutcome::Applied)
    }
}

/// Built-in seeds in dependency order. Categories always run; the demo seller
/// and its listings only when `demo_data` is on.
pub async fn seed_defaults(
    db: &DatabaseConnection,
    cfg: &SeedConfig,
) -> Result<Vec<(&'static str, SeedOutcome)>, SeedError> {
    let loader = SeedLoader::new(db);
    let mut outcomes = vec![(CATEGORIES_SEED, loader.apply_seed(&CategoriesSeed).await?)];

    if cfg.demo_data {
        outcomes.push((DEMO_SELLER_SEED, loader.apply_seed(&DemoSellerSeed).await?));
        outcomes.push((DEMO_LISTINGS_SEED, loader.apply_seed(&DemoListingsSeed).await?));
    }

    Ok(outcomes)
}

pub struct CategoriesSeed;

#[async_trait]
impl Seed for CategoriesSeed {
    fn name(&self) -> &str {
        CATEGORIES_SEED
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<(), SeedError> {
        let existing: Vec<String> = category::Entity::find()
            .all(txn)
            .await?
            .into_iter()
            .map(|row| row.slug)
            .collect();

        let missing: Vec<category::ActiveModel> = CATEGORIES
            .iter()
            .filter(|(_, slug)| !existing.iter().any(|known| known.as_str() == *slug))
            .map(|(name, slug)| category::ActiveModel {
                name: Set(name.to_string()),
                slug: Set(slug.to_string()),
                ..Default::default()
            })
            .collect();

        if !missing.is_empty() {
            category::Entity::insert_many(missing)
                .exec_without_returning(txn)
                .await?;
        }
        Ok(())
    }
}

pub struct DemoSellerSeed;

#[async_trait]
impl Seed for DemoSellerSeed {
    fn name(&self) -> &str {
        DEMO_SELLER_SEED
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<(), SeedError> {
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(DEMO_SELLER_EMAIL))
            .one(txn)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        let seller = user::ActiveModel {
            username: Set(DEMO_SELLER_USERNAME.to_string()),
            email: Set(DEMO_SELLER_EMAIL.to_string()),
            password_hash: Set(UNUSABLE_PASSWORD_HASH.to_string()),
            display_name: Set(Some(DEMO_SELLER_DISPLAY_NAME.to_string())),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        user::Entity::insert(seller)
            .exec_without_returning(txn)
            .await
            .map_err(|err| SeedError::Failed {
                seed: DEMO_SELLER_SEED.to_string(),
                reason: if is_unique_violation(&err) {
                    format!("username `{DEMO_SELLER_USERNAME}` is already taken")
                } else {
                    err.to_string()
                },
            })?;
        Ok(())
    }
}

pub struct DemoListingsSeed;

#[async_trait]
impl Seed for DemoListingsSeed {
    fn name(&self) -> &str {
        DEMO_LISTINGS_SEED
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<(), SeedError> {
        let seller = user::Entity::find()
            .filter(user::Column::Email.eq(DEMO_SELLER_EMAIL))
            .one(txn)
            .await?
            .ok_or_else(|| SeedError::MissingPrerequisite {
                seed: DEMO_LISTINGS_SEED.to_string(),
                missing: format!("demo seller `{DEMO_SELLER_EMAIL}`"),
            })?;

        let categories: HashMap<String, i64> = category::Entity::find()
            .all(txn)
            .await?
            .into_iter()
            .map(|row| (row.name, row.id))
            .collect();

        // Spread timestamps so the feed order matches the catalog order.
        let base = Utc::now();
        let mut rows = Vec::with_capacity(DEMO_LISTINGS.len());
        for (offset, demo) in DEMO_LISTINGS.iter().enumerate() {
            let category_id = *categories.get(demo.category).ok_or_else(|| {
                SeedError::MissingPrerequisite {
                    seed: DEMO_LISTINGS_SEED.to_string(),
                    missing: format!("category `{}`", demo.category),
                }
            })?;

            rows.push(listing::ActiveModel {
                owner_id: Set(seller.id),
                category_id: Set(category_id),
                title: Set(demo.title.to_string()),
                description: Set(demo.description.to_string()),
                price_cents: Set(demo.price_cents),
                condition: Set(Some(demo.condition.to_string())),
                color: Set(Some(demo.color.to_string())),
                status: Set(ListingStatus::Active.as_str().to_string()),
                created_at: Set(base - Duration::milliseconds(offset as i64)),
                ..Default::default()
            });
        }

        listing::Entity::insert_many(rows)
            .exec_without_returning(txn)
            .await?;
        Ok(())
    }
}
