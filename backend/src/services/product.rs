//! Product management service
//!
//! Product CRUD. The stock and damage_stock counters are read-only here;
//! they change only through ledger operations (movement service).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::Product;
use shared::validation::{validate_name, validate_price, validate_product_code};

use crate::error::{AppError, AppResult};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub product_code: String,
    pub price: Decimal,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

/// Input for updating a product. Stock fields are intentionally absent.
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub product_code: Option<String>,
    pub price: Option<Decimal>,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

/// Product row as stored
#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    product_code: String,
    price: Decimal,
    stock: i32,
    damage_stock: i32,
    brand_id: Option<Uuid>,
    category_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_model(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            product_code: self.product_code,
            price: self.price,
            stock: self.stock,
            damage_stock: self.damage_stock,
            brand_id: self.brand_id,
            category_id: self.category_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, product_code, price, stock, damage_stock, brand_id, category_id, created_at, updated_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product. Stock starts at zero; initial stock enters through
    /// an incoming-admin movement.
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        validate_name(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;
        validate_product_code(&input.product_code).map_err(|msg| AppError::Validation {
            field: "product_code".to_string(),
            message: msg.to_string(),
        })?;
        validate_price(input.price).map_err(|msg| AppError::Validation {
            field: "price".to_string(),
            message: msg.to_string(),
        })?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE product_code = $1",
        )
        .bind(&input.product_code)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("product_code".to_string()));
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (name, product_code, price, brand_id, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(&input.product_code)
        .bind(input.price)
        .bind(input.brand_id)
        .bind(input.category_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into_model())
    }

    /// Get a product by id
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1",
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into_model())
    }

    /// List products ordered by name
    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name",
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ProductRow::into_model).collect())
    }

    /// List products at or below a stock threshold
    pub async fn list_low_stock(&self, threshold: i32) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock <= $1 ORDER BY stock, name",
        ))
        .bind(threshold)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ProductRow::into_model).collect())
    }

    /// Update a product's catalog fields. Stock counters cannot be written
    /// through this path.
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let existing = self.get_product(product_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let product_code = input.product_code.unwrap_or(existing.product_code);
        let price = input.price.unwrap_or(existing.price);
        let brand_id = input.brand_id.or(existing.brand_id);
        let category_id = input.category_id.or(existing.category_id);

        validate_name(&name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;
        validate_product_code(&product_code).map_err(|msg| AppError::Validation {
            field: "product_code".to_string(),
            message: msg.to_string(),
        })?;
        validate_price(price).map_err(|msg| AppError::Validation {
            field: "price".to_string(),
            message: msg.to_string(),
        })?;

        let duplicate = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE product_code = $1 AND id != $2",
        )
        .bind(&product_code)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        if duplicate > 0 {
            return Err(AppError::DuplicateEntry("product_code".to_string()));
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = $1, product_code = $2, price = $3, brand_id = $4,
                category_id = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(&product_code)
        .bind(price)
        .bind(brand_id)
        .bind(category_id)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into_model())
    }

    /// Delete a product. Rejected while movements or orders still reference it.
    pub async fn delete_product(&self, product_id: Uuid) -> AppResult<()> {
        let referenced = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT (SELECT COUNT(*) FROM movement_items WHERE product_id = $1)
                 + (SELECT COUNT(*) FROM order_items WHERE product_id = $1)
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        if referenced > 0 {
            return Err(AppError::Conflict {
                resource: "product".to_string(),
                message: "Product is referenced by movements or orders".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }
}
