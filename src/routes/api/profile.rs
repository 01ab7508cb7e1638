use std::sync::Arc;

use axum::{Router, extract::State, routing::get};

use crate::{
    auth::Identity,
    routes::{ApiResult, JsonApiResponse},
    services::{ServiceContext, profile_service::ProfileStats},
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/profile", get(profile_stats))
        .with_state(state)
}

async fn profile_stats(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> ApiResult<ProfileStats> {
    let services = ServiceContext::from_state(state.as_ref());
    let stats = services.profile().get_profile_stats(&identity).await?;
    JsonApiResponse::ok(stats)
}
