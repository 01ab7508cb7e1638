pub mod api;
mod entry;

pub use entry::{API_PREFIX, router};
pub use crate::response::{ApiResult, JsonApiResponse};
