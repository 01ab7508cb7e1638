use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::Identity,
    db::{
        dao::{ListingQuery, PaginatedResponse},
        entities::{ListingStatus, category, listing},
    },
    middleware::MaybeIdentity,
    routes::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        catalog_service::{DealBucket, ListingDraft},
    },
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub page: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ListingStatus,
}

#[derive(Debug, Serialize)]
pub struct CategoryListingsResponse {
    pub category: category::Model,
    pub listings: PaginatedResponse<listing::Model>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{slug}/listings", get(category_listings))
        .route("/listings", get(search).post(create_listing))
        .route("/listings/{id}", get(get_listing))
        .route("/listings/{id}/status", post(update_status))
        .route("/deals", get(best_deals))
        .with_state(state)
}

async fn list_categories(State(state): State<Arc<AppState>>) -> ApiResult<Vec<category::Model>> {
    let services = ServiceContext::from_state(state.as_ref());
    let categories = services.catalog().list_categories().await?;
    JsonApiResponse::ok(categories)
}

async fn category_listings(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<CategoryListingsResponse> {
    let services = ServiceContext::from_state(state.as_ref());
    let (category, listings) = services
        .catalog()
        .category_listings(&slug, params.page.unwrap_or(1))
        .await?;
    JsonApiResponse::ok(CategoryListingsResponse { category, listings })
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<PaginatedResponse<listing::Model>> {
    let services = ServiceContext::from_state(state.as_ref());
    let query = ListingQuery {
        text: params.q,
        category_id: params.category_id,
    };
    let page = services
        .catalog()
        .search_page(&query, params.page.unwrap_or(1))
        .await?;
    JsonApiResponse::ok(page)
}

async fn create_listing(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(draft): Json<ListingDraft>,
) -> ApiResult<listing::Model> {
    let services = ServiceContext::from_state(state.as_ref());
    let listing = services.catalog().create_listing(&identity, draft).await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "listing created", listing)
}

async fn get_listing(
    State(state): State<Arc<AppState>>,
    MaybeIdentity(viewer): MaybeIdentity,
    Path(id): Path<i64>,
) -> ApiResult<listing::Model> {
    let services = ServiceContext::from_state(state.as_ref());
    let listing = services.catalog().get_listing(id, viewer.as_ref()).await?;
    JsonApiResponse::ok(listing)
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> ApiResult<listing::Model> {
    let services = ServiceContext::from_state(state.as_ref());
    let listing = services
        .catalog()
        .update_status(&identity, id, body.status)
        .await?;
    JsonApiResponse::ok(listing)
}

async fn best_deals(State(state): State<Arc<AppState>>) -> ApiResult<Vec<DealBucket>> {
    let services = ServiceContext::from_state(state.as_ref());
    let deals = services.catalog().best_deals().await?;
    JsonApiResponse::ok(deals)
}
