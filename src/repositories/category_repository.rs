use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, DomainError, Result};
use crate::models::{Category, PaginatedEntities, TransType};

/// Storage operations for categories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    async fn get_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// Case-insensitive substring search over names, one page at a time.
    async fn search_paginated(
        &self,
        limit: i64,
        offset: i64,
        search: Option<String>,
    ) -> Result<PaginatedEntities<Category>>;

    async fn search_flat(&self, search: Option<String>) -> Result<Vec<Category>>;

    async fn create(&self, name: &str, trans_type: Option<TransType>) -> Result<Category>;

    /// Renames a category. Returns `None` when the id is unknown.
    async fn update_name(&self, id: i64, name: &str) -> Result<Option<Category>>;

    /// Deletes a category. Returns false when the id is unknown.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Postgres-backed category store.
#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_name_conflict(err: sqlx::Error) -> AppError {
    AppError::from_constraint(err, Some(DomainError::CategoryExists), None)
}

#[async_trait]
impl CategoryStore for CategoryRepository {
    /// Finds a category by its id.
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, type, created_at, updated_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Finds a category by its exact name.
    async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, type, created_at, updated_at
            FROM categories
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    async fn search_paginated(
        &self,
        limit: i64,
        offset: i64,
        search: Option<String>,
    ) -> Result<PaginatedEntities<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, type, created_at, updated_at
            FROM categories
            WHERE ($1::text IS NULL OR POSITION(LOWER($1) IN LOWER(name)) > 0)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM categories
            WHERE ($1::text IS NULL OR POSITION(LOWER($1) IN LOWER(name)) > 0)
            "#,
        )
        .bind(&search)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(PaginatedEntities::from_page(rows, total, limit, offset))
    }

    async fn search_flat(&self, search: Option<String>) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, type, created_at, updated_at
            FROM categories
            WHERE ($1::text IS NULL OR POSITION(LOWER($1) IN LOWER(name)) > 0)
            ORDER BY name
            "#,
        )
        .bind(&search)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    async fn create(&self, name: &str, trans_type: Option<TransType>) -> Result<Category> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, type)
            VALUES ($1, $2)
            RETURNING id, name, type, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(trans_type)
        .fetch_one(&self.pool)
        .await
        .map_err(map_name_conflict)?;

        Ok(row)
    }

    async fn update_name(&self, id: i64, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, name, type, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_name_conflict)?;

        Ok(row)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
