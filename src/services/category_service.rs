use std::sync::Arc;

use tracing::{info, Instrument};

use crate::error::{AppError, DomainError, Result};
use crate::models::{Category, PaginatedEntities, TransType};
use crate::observability::RequestContext;
use crate::repositories::CategoryStore;

/// Service for managing categories with unique names.
#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn CategoryStore>) -> Self {
        Self { store }
    }

    pub async fn get_category(&self, ctx: &RequestContext, id: i64) -> Result<Category> {
        self.store
            .get_by_id(id)
            .instrument(ctx.span("get_category"))
            .await?
            .ok_or_else(|| DomainError::CategoryNotFound.into())
    }

    pub async fn search_paginated(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
        search: Option<String>,
    ) -> Result<PaginatedEntities<Category>> {
        self.store
            .search_paginated(limit, offset, search)
            .instrument(ctx.span("search_categories_paginated"))
            .await
    }

    pub async fn search_flat(
        &self,
        ctx: &RequestContext,
        search: Option<String>,
    ) -> Result<Vec<Category>> {
        self.store
            .search_flat(search)
            .instrument(ctx.span("search_categories"))
            .await
    }

    /// Creates a category. Fails with `CategoryExists` when the name is taken.
    pub async fn create_category(
        &self,
        ctx: &RequestContext,
        name: &str,
        trans_type: Option<TransType>,
    ) -> Result<Category> {
        async {
            if self.store.get_by_name(name).await?.is_some() {
                return Err(DomainError::CategoryExists.into());
            }

            let category = self.store.create(name, trans_type).await?;
            info!(category_id = category.id, "category created");
            Ok::<_, AppError>(category)
        }
        .instrument(ctx.span("create_category"))
        .await
    }

    /// Renames a category. Renaming to the current name is a no-op.
    pub async fn update_category_name(
        &self,
        ctx: &RequestContext,
        id: i64,
        name: &str,
    ) -> Result<Category> {
        async {
            let category = self
                .store
                .get_by_id(id)
                .await?
                .ok_or(DomainError::CategoryNotFound)?;

            if category.has_name(name) {
                return Ok(category);
            }

            if self.store.get_by_name(name).await?.is_some() {
                return Err(DomainError::CategoryExists.into());
            }

            let renamed = self
                .store
                .update_name(id, name)
                .await?
                .ok_or(DomainError::CategoryNotFound)?;
            info!(category_id = id, "category renamed");
            Ok::<_, AppError>(renamed)
        }
        .instrument(ctx.span("update_category_name"))
        .await
    }

    pub async fn delete_category(&self, ctx: &RequestContext, id: i64) -> Result<()> {
        async {
            if !self.store.delete(id).await? {
                return Err(DomainError::CategoryNotFound.into());
            }
            info!(category_id = id, "category deleted");
            Ok::<_, AppError>(())
        }
        .instrument(ctx.span("delete_category"))
        .await
    }
}
