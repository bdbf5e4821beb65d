//! HTTP handlers for employee endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::models::Employee;
use shared::types::MutationResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::employee::{
    CreateEmployeeInput, DeleteOutcome, EmployeeService, UpdateEmployeeInput,
};
use crate::AppState;

/// Create an employee
pub async fn create_employee(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateEmployeeInput>,
) -> AppResult<Json<Employee>> {
    let service = EmployeeService::new(state.db);
    let employee = service.create_employee(input).await?;
    Ok(Json(employee))
}

/// Get an employee
pub async fn get_employee(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<Employee>> {
    let service = EmployeeService::new(state.db);
    let employee = service.get_employee(employee_id).await?;
    Ok(Json(employee))
}

/// List employees
pub async fn list_employees(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Employee>>> {
    let service = EmployeeService::new(state.db);
    let employees = service.list_employees().await?;
    Ok(Json(employees))
}

/// Update an employee
pub async fn update_employee(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(employee_id): Path<Uuid>,
    Json(input): Json<UpdateEmployeeInput>,
) -> AppResult<Json<Employee>> {
    let service = EmployeeService::new(state.db);
    let employee = service.update_employee(employee_id, input).await?;
    Ok(Json(employee))
}

/// Delete an employee; referenced employees are deactivated instead
pub async fn delete_employee(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<MutationResponse>> {
    let service = EmployeeService::new(state.db);
    let message = match service.delete_employee(employee_id).await? {
        DeleteOutcome::Deleted => "Employee deleted",
        DeleteOutcome::Deactivated => "Employee has history on record; deactivated instead",
    };
    Ok(Json(MutationResponse::ok(message, employee_id)))
}
