//! Employee management service for SR sales reps and managers

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{Employee, EmployeeRole};
use shared::validation::{validate_email, validate_name, validate_phone};

use crate::error::{AppError, AppResult};

/// Employee service
#[derive(Clone)]
pub struct EmployeeService {
    db: PgPool,
}

/// Input for creating an employee
#[derive(Debug, Deserialize)]
pub struct CreateEmployeeInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: EmployeeRole,
    pub shop_id: Option<Uuid>,
}

/// Input for updating an employee
#[derive(Debug, Deserialize)]
pub struct UpdateEmployeeInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<EmployeeRole>,
    pub shop_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Outcome of a delete request; referenced employees are kept on record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Deactivated,
}

#[derive(Debug, FromRow)]
struct EmployeeRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
    shop_id: Option<Uuid>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EmployeeRow {
    fn into_model(self) -> AppResult<Employee> {
        let role = EmployeeRole::parse(&self.role)
            .ok_or_else(|| AppError::Internal(format!("Unknown employee role '{}'", self.role)))?;
        Ok(Employee {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            role,
            shop_id: self.shop_id,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const EMPLOYEE_COLUMNS: &str =
    "id, name, email, phone, role, shop_id, is_active, created_at, updated_at";

impl EmployeeService {
    /// Create a new EmployeeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an employee
    pub async fn create_employee(&self, input: CreateEmployeeInput) -> AppResult<Employee> {
        validate_employee_fields(&input.name, &input.email, input.phone.as_deref())?;

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE email = $1")
                .bind(&input.email)
                .fetch_one(&self.db)
                .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        if let Some(shop_id) = input.shop_id {
            self.ensure_shop(shop_id).await?;
        }

        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            r#"
            INSERT INTO employees (name, email, phone, role, shop_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {EMPLOYEE_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.role.as_str())
        .bind(input.shop_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Get an employee by id
    pub async fn get_employee(&self, employee_id: Uuid) -> AppResult<Employee> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1",
        ))
        .bind(employee_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee".to_string()))?;

        row.into_model()
    }

    /// List employees ordered by name
    pub async fn list_employees(&self) -> AppResult<Vec<Employee>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY name",
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(EmployeeRow::into_model).collect()
    }

    /// Update an employee
    pub async fn update_employee(
        &self,
        employee_id: Uuid,
        input: UpdateEmployeeInput,
    ) -> AppResult<Employee> {
        let existing = self.get_employee(employee_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let email = input.email.unwrap_or(existing.email);
        let phone = input.phone.or(existing.phone);
        let role = input.role.unwrap_or(existing.role);
        let shop_id = input.shop_id.or(existing.shop_id);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        validate_employee_fields(&name, &email, phone.as_deref())?;

        let duplicate = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM employees WHERE email = $1 AND id != $2",
        )
        .bind(&email)
        .bind(employee_id)
        .fetch_one(&self.db)
        .await?;

        if duplicate > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        if let Some(shop_id) = shop_id {
            self.ensure_shop(shop_id).await?;
        }

        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            r#"
            UPDATE employees
            SET name = $1, email = $2, phone = $3, role = $4, shop_id = $5,
                is_active = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING {EMPLOYEE_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(role.as_str())
        .bind(shop_id)
        .bind(is_active)
        .bind(employee_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Delete an employee. Employees referenced by movements or orders are
    /// deactivated instead so history keeps its author.
    pub async fn delete_employee(&self, employee_id: Uuid) -> AppResult<DeleteOutcome> {
        // Existence check first so a stale id reports NotFound, not Deactivated
        self.get_employee(employee_id).await?;

        let referenced = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT (SELECT COUNT(*) FROM movements WHERE employee_id = $1)
                 + (SELECT COUNT(*) FROM orders WHERE employee_id = $1)
            "#,
        )
        .bind(employee_id)
        .fetch_one(&self.db)
        .await?;

        if referenced > 0 {
            sqlx::query(
                "UPDATE employees SET is_active = false, updated_at = NOW() WHERE id = $1",
            )
            .bind(employee_id)
            .execute(&self.db)
            .await?;
            return Ok(DeleteOutcome::Deactivated);
        }

        sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(employee_id)
            .execute(&self.db)
            .await?;

        Ok(DeleteOutcome::Deleted)
    }

    async fn ensure_shop(&self, shop_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM shops WHERE id = $1)")
                .bind(shop_id)
                .fetch_one(&self.db)
                .await?;

        if !exists {
            return Err(AppError::NotFound("Shop".to_string()));
        }
        Ok(())
    }
}

fn validate_employee_fields(name: &str, email: &str, phone: Option<&str>) -> AppResult<()> {
    validate_name(name).map_err(|msg| AppError::Validation {
        field: "name".to_string(),
        message: msg.to_string(),
    })?;
    validate_email(email).map_err(|msg| AppError::Validation {
        field: "email".to_string(),
        message: msg.to_string(),
    })?;
    if let Some(phone) = phone {
        validate_phone(phone).map_err(|msg| AppError::Validation {
            field: "phone".to_string(),
            message: msg.to_string(),
        })?;
    }
    Ok(())
}
