use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::error::{AppError, DomainError, Result};
use crate::models::article::fold_article_rows;
use crate::models::{
    Article, ArticleCategory, ArticleRow, ArticleSearch, ArticleUpdate, NewArticle,
    RestfulPaginatedEntities,
};

/// Storage operations for articles and their category links.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    async fn search_paginated(
        &self,
        search: ArticleSearch,
    ) -> Result<RestfulPaginatedEntities<Article>>;

    async fn create(&self, article: NewArticle) -> Result<Article>;

    /// Writes the set fields. Fails with `ArticleNotFound` for unknown ids;
    /// an empty update succeeds without touching the database.
    async fn update(&self, id: i64, update: ArticleUpdate) -> Result<()>;

    /// Deletes an article. Returns false when the id is unknown.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Replaces the full set of linked categories.
    async fn link_categories(&self, id: i64, category_ids: Vec<i64>) -> Result<()>;
}

#[derive(Debug, FromRow)]
struct ArticleRecord {
    id: i64,
    header: String,
    sub_header: String,
    description: String,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ArticleRecord {
    fn into_article(self, categories: Vec<ArticleCategory>) -> Article {
        Article {
            id: self.id,
            header: self.header,
            sub_header: self.sub_header,
            description: self.description,
            image: self.image,
            categories,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn push_search_predicate<'a>(builder: &mut QueryBuilder<'a, Postgres>, search: &'a ArticleSearch) {
    builder.push(" WHERE 1 = 1");

    if let Some(term) = search.search.as_deref().filter(|t| !t.is_empty()) {
        builder
            .push(" AND (POSITION(LOWER(")
            .push_bind(term)
            .push(") IN LOWER(a.header)) > 0 OR POSITION(LOWER(")
            .push_bind(term)
            .push(") IN LOWER(a.sub_header)) > 0 OR POSITION(LOWER(")
            .push_bind(term)
            .push(") IN LOWER(a.description)) > 0)");
    }

    if !search.category_ids.is_empty() {
        builder
            .push(" AND EXISTS (SELECT 1 FROM categoriesArticles f WHERE f.article_id = a.id AND f.category_id = ANY(")
            .push_bind(search.category_ids.as_slice())
            .push("))");
    }
}

/// Builds the page query: a window over matching articles joined with all
/// of their categories.
pub fn build_search_query(search: &ArticleSearch) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(
        "WITH page AS (SELECT a.id, a.header, a.sub_header, a.description, a.image, a.created_at, a.updated_at FROM articles a",
    );
    push_search_predicate(&mut builder, search);
    builder
        .push(" ORDER BY a.id DESC LIMIT ")
        .push_bind(search.limit)
        .push(" OFFSET ")
        .push_bind(search.offset)
        .push(
            ") SELECT page.id, page.header, page.sub_header, page.description, page.image, \
             page.created_at, page.updated_at, c.id AS category_id, c.name AS category_name \
             FROM page \
             LEFT JOIN categoriesArticles ca ON ca.article_id = page.id \
             LEFT JOIN categories c ON c.id = ca.category_id \
             ORDER BY page.id DESC, c.id",
        );
    builder
}

/// Builds the count query sharing the page query's predicate.
pub fn build_count_query(search: &ArticleSearch) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM articles a");
    push_search_predicate(&mut builder, search);
    builder
}

/// Builds the dynamic update, or `None` when nothing is set.
pub fn build_update_query(id: i64, update: &ArticleUpdate) -> Option<QueryBuilder<'_, Postgres>> {
    if update.is_empty() {
        return None;
    }

    let mut builder = QueryBuilder::new("UPDATE articles SET ");
    {
        let mut fields = builder.separated(", ");
        if let Some(header) = &update.header {
            fields.push("header = ").push_bind_unseparated(header);
        }
        if let Some(image) = &update.image {
            fields.push("image = ").push_bind_unseparated(image);
        }
        if let Some(sub_header) = &update.sub_header {
            fields.push("sub_header = ").push_bind_unseparated(sub_header);
        }
        if let Some(description) = &update.description {
            fields.push("description = ").push_bind_unseparated(description);
        }
        fields.push("updated_at = NOW()");
    }
    builder.push(" WHERE id = ").push_bind(id);

    Some(builder)
}

/// Postgres-backed article store.
#[derive(Clone)]
pub struct ArticleRepository {
    pool: PgPool,
}

impl ArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn categories_of(&self, article_id: i64) -> Result<Vec<ArticleCategory>> {
        let rows = sqlx::query_as::<_, ArticleCategory>(
            r#"
            SELECT c.id, c.name
            FROM categoriesArticles ca
            INNER JOIN categories c ON c.id = ca.category_id
            WHERE ca.article_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }
}

#[async_trait]
impl ArticleStore for ArticleRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let record = sqlx::query_as::<_, ArticleRecord>(
            r#"
            SELECT id, header, sub_header, description, image, created_at, updated_at
            FROM articles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        match record {
            Some(record) => {
                let categories = self.categories_of(id).await?;
                Ok(Some(record.into_article(categories)))
            }
            None => Ok(None),
        }
    }

    async fn search_paginated(
        &self,
        search: ArticleSearch,
    ) -> Result<RestfulPaginatedEntities<Article>> {
        let rows = build_search_query(&search)
            .build_query_as::<ArticleRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let total: i64 = build_count_query(&search)
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(RestfulPaginatedEntities::from_window(
            fold_article_rows(rows),
            total,
            search.limit,
            search.offset,
        ))
    }

    async fn create(&self, article: NewArticle) -> Result<Article> {
        let record = sqlx::query_as::<_, ArticleRecord>(
            r#"
            INSERT INTO articles (header, sub_header, description)
            VALUES ($1, $2, $3)
            RETURNING id, header, sub_header, description, image, created_at, updated_at
            "#,
        )
        .bind(&article.header)
        .bind(&article.sub_header)
        .bind(&article.description)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(record.into_article(Vec::new()))
    }

    async fn update(&self, id: i64, update: ArticleUpdate) -> Result<()> {
        let Some(mut builder) = build_update_query(id, &update) else {
            return Ok(());
        };

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ArticleNotFound.into());
        }

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn link_categories(&self, id: i64, category_ids: Vec<i64>) -> Result<()> {
        let mut category_ids = category_ids;
        category_ids.sort_unstable();
        category_ids.dedup();

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query_scalar::<_, i64>("SELECT id FROM articles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(DomainError::ArticleNotFound)?;

        sqlx::query("DELETE FROM categoriesArticles WHERE article_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if !category_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO categoriesArticles (article_id, category_id)
                SELECT $1, UNNEST($2::bigint[])
                "#,
            )
            .bind(id)
            .bind(&category_ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_constraint(e, None, Some(DomainError::CategoryNotFound)))?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        Ok(())
    }
}
