//! Brand and category management service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{Brand, Category};
use shared::validation::validate_name;

use crate::error::{AppError, AppResult};

/// Catalog service for brands and categories
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Input for creating or renaming a brand/category
#[derive(Debug, Deserialize)]
pub struct NameInput {
    pub name: String,
}

#[derive(Debug, FromRow)]
struct NamedRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // Brands
    // ------------------------------------------------------------------

    /// Create a brand
    pub async fn create_brand(&self, input: NameInput) -> AppResult<Brand> {
        self.validate_unique_name("brands", &input.name, None).await?;

        let row = sqlx::query_as::<_, NamedRow>(
            "INSERT INTO brands (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;

        Ok(Brand {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        })
    }

    /// List brands ordered by name
    pub async fn list_brands(&self) -> AppResult<Vec<Brand>> {
        let rows = sqlx::query_as::<_, NamedRow>(
            "SELECT id, name, created_at FROM brands ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Brand {
                id: r.id,
                name: r.name,
                created_at: r.created_at,
            })
            .collect())
    }

    /// Rename a brand
    pub async fn update_brand(&self, brand_id: Uuid, input: NameInput) -> AppResult<Brand> {
        self.validate_unique_name("brands", &input.name, Some(brand_id))
            .await?;

        let row = sqlx::query_as::<_, NamedRow>(
            "UPDATE brands SET name = $1 WHERE id = $2 RETURNING id, name, created_at",
        )
        .bind(&input.name)
        .bind(brand_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Brand".to_string()))?;

        Ok(Brand {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        })
    }

    /// Delete a brand. Rejected while products still reference it.
    pub async fn delete_brand(&self, brand_id: Uuid) -> AppResult<()> {
        let in_use = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE brand_id = $1",
        )
        .bind(brand_id)
        .fetch_one(&self.db)
        .await?;

        if in_use > 0 {
            return Err(AppError::Conflict {
                resource: "brand".to_string(),
                message: format!("Brand is still used by {} product(s)", in_use),
            });
        }

        let result = sqlx::query("DELETE FROM brands WHERE id = $1")
            .bind(brand_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Brand".to_string()));
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// Create a category
    pub async fn create_category(&self, input: NameInput) -> AppResult<Category> {
        self.validate_unique_name("categories", &input.name, None)
            .await?;

        let row = sqlx::query_as::<_, NamedRow>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;

        Ok(Category {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        })
    }

    /// List categories ordered by name
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, NamedRow>(
            "SELECT id, name, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Category {
                id: r.id,
                name: r.name,
                created_at: r.created_at,
            })
            .collect())
    }

    /// Rename a category
    pub async fn update_category(
        &self,
        category_id: Uuid,
        input: NameInput,
    ) -> AppResult<Category> {
        self.validate_unique_name("categories", &input.name, Some(category_id))
            .await?;

        let row = sqlx::query_as::<_, NamedRow>(
            "UPDATE categories SET name = $1 WHERE id = $2 RETURNING id, name, created_at",
        )
        .bind(&input.name)
        .bind(category_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

        Ok(Category {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        })
    }

    /// Delete a category. Rejected while products still reference it.
    pub async fn delete_category(&self, category_id: Uuid) -> AppResult<()> {
        let in_use = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE category_id = $1",
        )
        .bind(category_id)
        .fetch_one(&self.db)
        .await?;

        if in_use > 0 {
            return Err(AppError::Conflict {
                resource: "category".to_string(),
                message: format!("Category is still used by {} product(s)", in_use),
            });
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category".to_string()));
        }

        Ok(())
    }

    /// Validate name is non-empty and unique within the table
    async fn validate_unique_name(
        &self,
        table: &str,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<()> {
        validate_name(name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        // Table names are fixed by the two callers above, never user input
        let query = match exclude {
            Some(_) => format!("SELECT COUNT(*) FROM {} WHERE name = $1 AND id != $2", table),
            None => format!("SELECT COUNT(*) FROM {} WHERE name = $1", table),
        };

        let mut q = sqlx::query_scalar::<_, i64>(&query).bind(name);
        if let Some(id) = exclude {
            q = q.bind(id);
        }
        let existing = q.fetch_one(&self.db).await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }

        Ok(())
    }
}
