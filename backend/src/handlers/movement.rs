//! HTTP handlers for stock movement endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use shared::models::{Movement, MovementWithItems};
use shared::types::MutationResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::movement::{
    CreateIncomingAdminInput, CreateIncomingInput, CreateOutgoingInput, MovementFilter,
    MovementItemInput, MovementService, UpdateMovementInput,
};
use crate::AppState;

/// Record an outgoing movement (stock leaving)
pub async fn create_outgoing(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateOutgoingInput>,
) -> AppResult<Json<MutationResponse>> {
    let service = MovementService::new(state.db);
    let movement_id = service.create_outgoing(input).await?;
    Ok(Json(MutationResponse::ok(
        "Outgoing movement recorded",
        movement_id,
    )))
}

/// Record an incoming movement (stock arriving)
pub async fn create_incoming(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateIncomingInput>,
) -> AppResult<Json<MutationResponse>> {
    let service = MovementService::new(state.db);
    let movement_id = service.create_incoming(input).await?;
    Ok(Json(MutationResponse::ok(
        "Incoming movement recorded",
        movement_id,
    )))
}

/// Record a bulk administrative incoming movement
pub async fn create_incoming_admin(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateIncomingAdminInput>,
) -> AppResult<Json<MutationResponse>> {
    let service = MovementService::new(state.db);
    let movement_id = service.create_incoming_admin(input).await?;
    Ok(Json(MutationResponse::ok(
        "Incoming movement recorded",
        movement_id,
    )))
}

/// Revise a movement's items (reverse old effects, apply new ones)
pub async fn update_movement(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
    Json(input): Json<UpdateMovementInput>,
) -> AppResult<Json<MutationResponse>> {
    let service = MovementService::new(state.db);
    service.update_movement(movement_id, input).await?;
    Ok(Json(MutationResponse::ok("Movement updated", movement_id)))
}

/// Delete a movement, reversing its stock effects
pub async fn delete_movement(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<MutationResponse>> {
    let service = MovementService::new(state.db);
    service.delete_movement(movement_id).await?;
    Ok(Json(MutationResponse::ok("Movement deleted", movement_id)))
}

/// Pre-validate an outgoing batch without writing anything
pub async fn check_sufficiency(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(items): Json<Vec<MovementItemInput>>,
) -> AppResult<Json<MutationResponse>> {
    let service = MovementService::new(state.db);
    service.check_sufficiency(&items).await?;
    Ok(Json(MutationResponse::ok_without_id(
        "Sufficient stock for all items",
    )))
}

/// Get a movement with its items
pub async fn get_movement(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<MovementWithItems>> {
    let service = MovementService::new(state.db);
    let movement = service.get_movement(movement_id).await?;
    Ok(Json(movement))
}

/// List movements
pub async fn list_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<MovementFilter>,
) -> AppResult<Json<Vec<Movement>>> {
    let service = MovementService::new(state.db);
    let movements = service.list_movements(filter).await?;
    Ok(Json(movements))
}
