//! HTTP handlers for shop endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::models::Shop;
use shared::types::MutationResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::shop::{CreateShopInput, ShopService, UpdateShopInput};
use crate::AppState;

/// Create a shop
pub async fn create_shop(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateShopInput>,
) -> AppResult<Json<Shop>> {
    let service = ShopService::new(state.db);
    let shop = service.create_shop(input).await?;
    Ok(Json(shop))
}

/// Get a shop
pub async fn get_shop(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(shop_id): Path<Uuid>,
) -> AppResult<Json<Shop>> {
    let service = ShopService::new(state.db);
    let shop = service.get_shop(shop_id).await?;
    Ok(Json(shop))
}

/// List shops
pub async fn list_shops(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Shop>>> {
    let service = ShopService::new(state.db);
    let shops = service.list_shops().await?;
    Ok(Json(shops))
}

/// Update a shop
pub async fn update_shop(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(shop_id): Path<Uuid>,
    Json(input): Json<UpdateShopInput>,
) -> AppResult<Json<Shop>> {
    let service = ShopService::new(state.db);
    let shop = service.update_shop(shop_id, input).await?;
    Ok(Json(shop))
}

/// Delete a shop
pub async fn delete_shop(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(shop_id): Path<Uuid>,
) -> AppResult<Json<MutationResponse>> {
    let service = ShopService::new(state.db);
    service.delete_shop(shop_id).await?;
    Ok(Json(MutationResponse::ok("Shop deleted", shop_id)))
}
