//! Shop management service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::Shop;
use shared::validation::{validate_name, validate_phone};

use crate::error::{AppError, AppResult};

/// Shop service
#[derive(Clone)]
pub struct ShopService {
    db: PgPool,
}

/// Input for creating a shop
#[derive(Debug, Deserialize)]
pub struct CreateShopInput {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Input for updating a shop
#[derive(Debug, Deserialize)]
pub struct UpdateShopInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, FromRow)]
struct ShopRow {
    id: Uuid,
    name: String,
    address: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ShopRow {
    fn into_model(self) -> Shop {
        Shop {
            id: self.id,
            name: self.name,
            address: self.address,
            phone: self.phone,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl ShopService {
    /// Create a new ShopService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a shop
    pub async fn create_shop(&self, input: CreateShopInput) -> AppResult<Shop> {
        validate_shop_fields(&input.name, input.phone.as_deref())?;

        let row = sqlx::query_as::<_, ShopRow>(
            r#"
            INSERT INTO shops (name, address, phone)
            VALUES ($1, $2, $3)
            RETURNING id, name, address, phone, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into_model())
    }

    /// Get a shop by id
    pub async fn get_shop(&self, shop_id: Uuid) -> AppResult<Shop> {
        let row = sqlx::query_as::<_, ShopRow>(
            "SELECT id, name, address, phone, created_at, updated_at FROM shops WHERE id = $1",
        )
        .bind(shop_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Shop".to_string()))?;

        Ok(row.into_model())
    }

    /// List shops, newest first
    pub async fn list_shops(&self) -> AppResult<Vec<Shop>> {
        let rows = sqlx::query_as::<_, ShopRow>(
            "SELECT id, name, address, phone, created_at, updated_at FROM shops ORDER BY created_at DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ShopRow::into_model).collect())
    }

    /// Update a shop
    pub async fn update_shop(&self, shop_id: Uuid, input: UpdateShopInput) -> AppResult<Shop> {
        let existing = self.get_shop(shop_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let address = input.address.or(existing.address);
        let phone = input.phone.or(existing.phone);

        validate_shop_fields(&name, phone.as_deref())?;

        let row = sqlx::query_as::<_, ShopRow>(
            r#"
            UPDATE shops
            SET name = $1, address = $2, phone = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING id, name, address, phone, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(&address)
        .bind(&phone)
        .bind(shop_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into_model())
    }

    /// Delete a shop. Rejected while orders still reference it.
    pub async fn delete_shop(&self, shop_id: Uuid) -> AppResult<()> {
        let in_use = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE shop_id = $1")
            .bind(shop_id)
            .fetch_one(&self.db)
            .await?;

        if in_use > 0 {
            return Err(AppError::Conflict {
                resource: "shop".to_string(),
                message: format!("Shop has {} order(s) on record", in_use),
            });
        }

        let result = sqlx::query("DELETE FROM shops WHERE id = $1")
            .bind(shop_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Shop".to_string()));
        }

        Ok(())
    }
}

fn validate_shop_fields(name: &str, phone: Option<&str>) -> AppResult<()> {
    validate_name(name).map_err(|msg| AppError::Validation {
        field: "name".to_string(),
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
