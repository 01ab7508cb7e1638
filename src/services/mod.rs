pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod context;
pub mod profile_service;

pub use context::ServiceContext;
