//! HTTP handlers for product endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::Product;
use shared::types::MutationResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::{CreateProductInput, ProductService, UpdateProductInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.create_product(input).await?;
    Ok(Json(product))
}

/// Get a product
pub async fn get_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.get_product(product_id).await?;
    Ok(Json(product))
}

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    let service = ProductService::new(state.db);
    let products = service.list_products().await?;
    Ok(Json(products))
}

/// List products at or below a stock threshold (default 10)
pub async fn list_low_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let service = ProductService::new(state.db);
    let products = service.list_low_stock(query.threshold.unwrap_or(10)).await?;
    Ok(Json(products))
}

/// Update a product's catalog fields
pub async fn update_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.update_product(product_id, input).await?;
    Ok(Json(product))
}

/// Delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<MutationResponse>> {
    let service = ProductService::new(state.db);
    service.delete_product(product_id).await?;
    Ok(Json(MutationResponse::ok("Product deleted", product_id)))
}
