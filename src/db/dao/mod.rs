pub mod base;
pub mod cart_dao;
pub mod category_dao;
mod context;
pub mod error;
pub mod listing_dao;
pub mod rating_dao;
pub mod seed_flag_dao;
pub mod user_dao;

pub use base::{DaoBase, PaginatedResponse};
pub use cart_dao::{CartDao, CartLine};
pub use category_dao::CategoryDao;
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult, is_unique_violation};
pub use listing_dao::{ListingDao, ListingQuery, ListingSearch, NewListing, PriceBand};
pub use rating_dao::{RatingDao, RatingSummary};
pub use seed_flag_dao::SeedFlagDao;
pub use user_dao::UserDao;
