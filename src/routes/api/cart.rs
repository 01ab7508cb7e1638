use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::Identity,
    routes::{ApiResult, JsonApiResponse},
    services::{ServiceContext, cart_service::CartView},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub listing_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Serialize)]
pub struct CartLineQuantity {
    pub listing_id: i64,
    pub quantity: i32,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cart", get(list_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/{listing_id}", delete(remove_item))
        .route("/cart/checkout", post(checkout))
        .with_state(state)
}

async fn list_cart(State(state): State<Arc<AppState>>, identity: Identity) -> ApiResult<CartView> {
    let services = ServiceContext::from_state(state.as_ref());
    let cart = services.cart().list_cart(&identity).await?;
    JsonApiResponse::ok(cart)
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(body): Json<AddItemRequest>,
) -> ApiResult<CartLineQuantity> {
    let services = ServiceContext::from_state(state.as_ref());
    let quantity = services
        .cart()
        .add_to_cart(&identity, body.listing_id, body.quantity)
        .await?;
    JsonApiResponse::ok(CartLineQuantity {
        listing_id: body.listing_id,
        quantity,
    })
}

async fn remove_item(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(listing_id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let services = ServiceContext::from_state(state.as_ref());
    services.cart().remove_from_cart(&identity, listing_id).await?;
    JsonApiResponse::ok(serde_json::json!({ "listing_id": listing_id, "removed": true }))
}

async fn checkout(State(state): State<Arc<AppState>>, identity: Identity) -> ApiResult<()> {
    let services = ServiceContext::from_state(state.as_ref());
    services.cart().checkout(&identity).await?;
    JsonApiResponse::ok(())
}
