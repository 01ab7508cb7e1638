pub mod auth;
pub mod cart;
pub mod catalog;
pub mod profile;
mod router;

pub use router::router;
