#[allow(unused_imports)]
pub mod prelude {
    pub use super::cart_item::Entity as CartItem;
    pub use super::category::Entity as Category;
    pub use super::listing::Entity as Listing;
    pub use super::seed_flag::Entity as SeedFlag;
    pub use super::seller_rating::Entity as SellerRating;
    pub use super::user::Entity as User;
}

pub mod cart_item;
pub mod category;
pub mod listing;
pub mod seed_flag;
pub mod seller_rating;
pub mod user;

pub use listing::ListingStatus;
pub use seller_rating::NewSellerRating;
