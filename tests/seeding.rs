use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, EntityTrait, PaginatorTrait, Set};

use dormcart::{
    config::SeedConfig,
    db::{
        dao::DaoContext,
        entities::{category, listing, seed_flag, user},
        seed::{
            CATEGORIES_SEED, CategoriesSeed, DEMO_LISTINGS_SEED, DEMO_SELLER_SEED,
            DemoListingsSeed, Seed, SeedError, SeedLoader, SeedOutcome, data, seed_defaults,
        },
    },
    test_helpers::test_db,
};

/// Writes one category, then fails.
struct HalfwaySeed;

#[async_trait]
impl Seed for HalfwaySeed {
    fn name(&self) -> &str {
        "halfway_v1"
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<(), SeedError> {
        category::Entity::insert(category::ActiveModel {
            name: Set("Furniture".to_string()),
            slug: Set("furniture".to_string()),
            ..Default::default()
        })
        .exec_without_returning(txn)
        .await?;

        Err(SeedError::Failed {
            seed: self.name().to_string(),
            reason: "ran out of furniture".to_string(),
        })
    }
}

#[tokio::test]
async fn applying_many_times_equals_applying_once() {
    let db = test_db().await;
    let loader = SeedLoader::new(&db);

    let mut outcomes = Vec::new();
    for _ in 0..4 {
        outcomes.push(loader.apply_seed(&CategoriesSeed).await.expect("seed applies"));
    }

    assert_eq!(outcomes[0], SeedOutcome::Applied);
    assert!(outcomes[1..].iter().all(|o| *o == SeedOutcome::AlreadyApplied));
    assert_eq!(
        category::Entity::find().count(&db).await.expect("count"),
        data::CATEGORIES.len() as u64
    );
    assert_eq!(seed_flag::Entity::find().count(&db).await.expect("count"), 1);
}

#[tokio::test]
async fn failed_seed_leaves_no_rows_and_no_flag() {
    let db = test_db().await;
    let loader = SeedLoader::new(&db);

    let err = loader
        .apply_seed(&HalfwaySeed)
        .await
        .expect_err("seed should fail");
    assert!(matches!(err, SeedError::Failed { .. }));

    assert_eq!(category::Entity::find().count(&db).await.expect("count"), 0);
    assert!(
        DaoContext::new(&db)
            .seed_flag()
            .list()
            .await
            .expect("flags load")
            .is_empty()
    );
}

#[tokio::test]
async fn demo_listings_need_their_seller() {
    let db = test_db().await;
    let loader = SeedLoader::new(&db);
    loader.apply_seed(&CategoriesSeed).await.expect("categories");

    let err = loader
        .apply_seed(&DemoListingsSeed)
        .await
        .expect_err("seller is missing");
    assert!(matches!(err, SeedError::MissingPrerequisite { .. }));
    assert_eq!(listing::Entity::find().count(&db).await.expect("count"), 0);

    let flags: Vec<String> = DaoContext::new(&db)
        .seed_flag()
        .list()
        .await
        .expect("flags load")
        .into_iter()
        .map(|flag| flag.name)
        .collect();
    assert_eq!(flags, vec![CATEGORIES_SEED.to_string()]);
}

#[tokio::test]
async fn defaults_are_idempotent() {
    let db = test_db().await;
    let cfg = SeedConfig { demo_data: true };

    let first = seed_defaults(&db, &cfg).await.expect("first run");
    let second = seed_defaults(&db, &cfg).await.expect("second run");

    assert_eq!(
        first,
        vec![
            (CATEGORIES_SEED, SeedOutcome::Applied),
            (DEMO_SELLER_SEED, SeedOutcome::Applied),
            (DEMO_LISTINGS_SEED, SeedOutcome::Applied),
        ]
    );
    assert!(second.iter().all(|(_, o)| *o == SeedOutcome::AlreadyApplied));

    assert_eq!(user::Entity::find().count(&db).await.expect("count"), 1);
    assert_eq!(
        listing::Entity::find().count(&db).await.expect("count"),
        data::DEMO_LISTINGS.len() as u64
    );
    assert_eq!(seed_flag::Entity::find().count(&db).await.expect("count"), 3);
}

#[tokio::test]
async fn demo_data_switch_only_seeds_categories() {
    let db = test_db().await;

    let outcomes = seed_defaults(&db, &SeedConfig { demo_data: false })
        .await
        .expect("seed runs");

    assert_eq!(outcomes, vec![(CATEGORIES_SEED, SeedOutcome::Applied)]);
    assert_eq!(user::Entity::find().count(&db).await.expect("count"), 0);
}
