//! HTTP handlers for brand and category endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::models::{Brand, Category};
use shared::types::MutationResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::catalog::{CatalogService, NameInput};
use crate::AppState;

/// Create a brand
pub async fn create_brand(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<NameInput>,
) -> AppResult<Json<Brand>> {
    let service = CatalogService::new(state.db);
    let brand = service.create_brand(input).await?;
    Ok(Json(brand))
}

/// List brands
pub async fn list_brands(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Brand>>> {
    let service = CatalogService::new(state.db);
    let brands = service.list_brands().await?;
    Ok(Json(brands))
}

/// Rename a brand
pub async fn update_brand(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(brand_id): Path<Uuid>,
    Json(input): Json<NameInput>,
) -> AppResult<Json<Brand>> {
    let service = CatalogService::new(state.db);
    let brand = service.update_brand(brand_id, input).await?;
    Ok(Json(brand))
}

/// Delete a brand
pub async fn delete_brand(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(brand_id): Path<Uuid>,
) -> AppResult<Json<MutationResponse>> {
    let service = CatalogService::new(state.db);
    service.delete_brand(brand_id).await?;
    Ok(Json(MutationResponse::ok("Brand deleted", brand_id)))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<NameInput>,
) -> AppResult<Json<Category>> {
    let service = CatalogService::new(state.db);
    let category = service.create_category(input).await?;
    Ok(Json(category))
}

/// List categories
pub async fn list_categories(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Category>>> {
    let service = CatalogService::new(state.db);
    let categories = service.list_categories().await?;
    Ok(Json(categories))
}

/// Rename a category
pub async fn update_category(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
    Json(input): Json<NameInput>,
) -> AppResult<Json<Category>> {
    let service = CatalogService::new(state.db);
    let category = service.update_category(category_id, input).await?;
    Ok(Json(category))
}

/// Delete a category
pub async fn delete_category(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<MutationResponse>> {
    let service = CatalogService::new(state.db);
    service.delete_category(category_id).await?;
    Ok(Json(MutationResponse::ok("Category deleted", category_id)))
}
