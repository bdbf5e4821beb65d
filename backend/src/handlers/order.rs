//! HTTP handlers for order endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use shared::models::{Order, OrderWithItems};
use shared::types::MutationResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::order::{
    CreateOrderInput, OrderFilter, OrderService, RecordReturnsInput, UpdatePaymentInput,
    UpdateStatusInput,
};
use crate::AppState;

/// Create an order. Stock is not affected; goods move via movements.
pub async fn create_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<OrderWithItems>> {
    let service = OrderService::new(state.db);
    let order = service.create_order(input).await?;
    Ok(Json(order))
}

/// Get an order with its items
pub async fn get_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderWithItems>> {
    let service = OrderService::new(state.db);
    let order = service.get_order(order_id).await?;
    Ok(Json(order))
}

/// List orders
pub async fn list_orders(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<Vec<Order>>> {
    let service = OrderService::new(state.db);
    let orders = service.list_orders(filter).await?;
    Ok(Json(orders))
}

/// Update an order's status
pub async fn update_order_status(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.db);
    let order = service.update_status(order_id, input).await?;
    Ok(Json(order))
}

/// Record a payment against an order
pub async fn update_order_payment(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdatePaymentInput>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.db);
    let order = service.update_payment(order_id, input).await?;
    Ok(Json(order))
}

/// Record returned/damaged units on an order
pub async fn record_order_returns(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<RecordReturnsInput>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.db);
    let order = service.record_returns(order_id, input).await?;
    Ok(Json(order))
}

/// Delete an order
pub async fn delete_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<MutationResponse>> {
    let service = OrderService::new(state.db);
    service.delete_order(order_id).await?;
    Ok(Json(MutationResponse::ok("Order deleted", order_id)))
}
