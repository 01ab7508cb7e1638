use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{auth, cart, catalog, profile};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::router(state.clone()))
        .merge(catalog::router(state.clone()))
        .merge(cart::router(state.clone()))
        .merge(profile::router(state))
}
