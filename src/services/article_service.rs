use std::sync::Arc;

use axum::body::Bytes;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::error::{AppError, DomainError, Result};
use crate::models::{Article, ArticleSearch, ArticleUpdate, NewArticle, RestfulPaginatedEntities};
use crate::observability::{get_metrics, RequestContext};
use crate::repositories::ArticleStore;
use crate::storage::{FileGateway, StoredObject};

/// Service for articles and their attached images.
///
/// Images live in object storage under random keys; the article row only
/// keeps the key.
#[derive(Clone)]
pub struct ArticleService {
    store: Arc<dyn ArticleStore>,
    files: Arc<dyn FileGateway>,
    bucket: String,
}

impl ArticleService {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        files: Arc<dyn FileGateway>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            files,
            bucket: bucket.into(),
        }
    }

    pub async fn get_article(&self, ctx: &RequestContext, id: i64) -> Result<Article> {
        self.store
            .get_by_id(id)
            .instrument(ctx.span("get_article"))
            .await?
            .ok_or_else(|| DomainError::ArticleNotFound.into())
    }

    pub async fn search_articles(
        &self,
        ctx: &RequestContext,
        search: ArticleSearch,
    ) -> Result<RestfulPaginatedEntities<Article>> {
        self.store
            .search_paginated(search)
            .instrument(ctx.span("search_articles"))
            .await
    }

    pub async fn create_article(&self, ctx: &RequestContext, article: NewArticle) -> Result<Article> {
        async {
            let created = self.store.create(article).await?;
            info!(article_id = created.id, "article created");
            Ok::<_, AppError>(created)
        }
        .instrument(ctx.span("create_article"))
        .await
    }

    /// Applies the set fields and returns the refreshed article.
    pub async fn update_article(
        &self,
        ctx: &RequestContext,
        id: i64,
        update: ArticleUpdate,
    ) -> Result<Article> {
        async {
            self.store.update(id, update).await?;
            let article = self
                .store
                .get_by_id(id)
                .await?
                .ok_or(DomainError::ArticleNotFound)?;
            info!(article_id = id, "article updated");
            Ok::<_, AppError>(article)
        }
        .instrument(ctx.span("update_article"))
        .await
    }

    /// Deletes the article row. A failure to remove its image object is
    /// logged and otherwise ignored.
    pub async fn delete_article(&self, ctx: &RequestContext, id: i64) -> Result<()> {
        async {
            let article = self
                .store
                .get_by_id(id)
                .await?
                .ok_or(DomainError::ArticleNotFound)?;

            if !self.store.delete(id).await? {
                return Err(DomainError::ArticleNotFound.into());
            }

            if let Some(key) = article.image.as_deref() {
                if let Err(e) = self.files.delete_object(&self.bucket, key).await {
                    warn!(article_id = id, key, error = %e, "orphaned article image");
                }
            }

            info!(article_id = id, "article deleted");
            Ok::<_, AppError>(())
        }
        .instrument(ctx.span("delete_article"))
        .await
    }

    /// Replaces the categories linked to an article.
    pub async fn link_categories(
        &self,
        ctx: &RequestContext,
        id: i64,
        category_ids: Vec<i64>,
    ) -> Result<Article> {
        async {
            let count = category_ids.len();
            self.store.link_categories(id, category_ids).await?;
            let article = self
                .store
                .get_by_id(id)
                .await?
                .ok_or(DomainError::ArticleNotFound)?;
            info!(article_id = id, categories = count, "article categories linked");
            Ok::<_, AppError>(article)
        }
        .instrument(ctx.span("link_article_categories"))
        .await
    }

    /// Fetches the image attached to an article. Articles without an image
    /// report `ArticleNotFound`.
    pub async fn get_image(&self, ctx: &RequestContext, id: i64) -> Result<StoredObject> {
        async {
            let article = self
                .store
                .get_by_id(id)
                .await?
                .ok_or(DomainError::ArticleNotFound)?;
            let key = article.image.ok_or(DomainError::ArticleNotFound)?;

            let object = self
                .files
                .get_object(&self.bucket, &key)
                .await
                .map_err(|_| DomainError::StorageUnavailable)?;
            Ok::<_, AppError>(object)
        }
        .instrument(ctx.span("get_article_image"))
        .await
    }

    /// Replaces the article image. The previous object is removed before
    /// the new one is uploaded under a fresh UUID key.
    pub async fn link_image(
        &self,
        ctx: &RequestContext,
        id: i64,
        body: Bytes,
        content_type: &str,
    ) -> Result<Article> {
        async {
            let mut article = self
                .store
                .get_by_id(id)
                .await?
                .ok_or(DomainError::ArticleNotFound)?;

            if let Some(old_key) = article.image.as_deref() {
                self.files
                    .delete_object(&self.bucket, old_key)
                    .await
                    .map_err(|_| DomainError::StorageUnavailable)?;
            }

            let key = Uuid::new_v4().to_string();
            let uploaded = self
                .files
                .upload_object(&self.bucket, &key, body, content_type)
                .await
                .map_err(|_| DomainError::StorageUnavailable)?;

            self.store.update(id, ArticleUpdate::image(key.clone())).await?;

            get_metrics().record_image_uploaded(uploaded.size);
            info!(article_id = id, key = %key, size = uploaded.size, "article image linked");

            article.image = Some(key);
            Ok::<_, AppError>(article)
        }
        .instrument(ctx.span("link_article_image"))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockArticleStore;
    use crate::storage::{MockFileGateway, UploadResult};
    use chrono::Utc;
    use mockall::predicate::eq;

    const BUCKET: &str = "images";

    fn article(id: i64, image: Option<&str>) -> Article {
        Article {
            id,
            header: "Budgeting".to_string(),
            sub_header: "Basics".to_string(),
            description: "How to plan a month".to_string(),
            image: image.map(str::to_string),
            categories: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(store: MockArticleStore, files: MockFileGateway) -> ArticleService {
        ArticleService::new(Arc::new(store), Arc::new(files), BUCKET)
    }

    fn ctx() -> RequestContext {
        RequestContext::new("test").with_user("admin", true)
    }

    fn uploaded(key: &str, size: u64) -> UploadResult {
        UploadResult {
            bucket: BUCKET.to_string(),
            key: key.to_string(),
            size,
            etag: None,
        }
    }

    #[tokio::test]
    async fn test_get_unknown_article_fails() {
        let mut store = MockArticleStore::new();
        store.expect_get_by_id().returning(|_| Ok(None));

        let err = service(store, MockFileGateway::new())
            .get_article(&ctx(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::ArticleNotFound)));
    }

    #[tokio::test]
    async fn test_link_image_replaces_previous_object() {
        let mut store = MockArticleStore::new();
        store
            .expect_get_by_id()
            .with(eq(7))
            .returning(|id| Ok(Some(article(id, Some("old-key")))));
        store
            .expect_update()
            .withf(|id, update| *id == 7 && update.image.is_some() && update.header.is_none())
            .times(1)
            .returning(|_, _| Ok(()));

        let mut files = MockFileGateway::new();
        files
            .expect_delete_object()
            .withf(|bucket, key| bucket == BUCKET && key == "old-key")
            .times(1)
            .returning(|_, _| Ok(()));
        files
            .expect_upload_object()
            .withf(|bucket, key, body, content_type| {
                bucket == BUCKET
                    && Uuid::parse_str(key).is_ok()
                    && body.len() == 3
                    && content_type == "image/png"
            })
            .times(1)
            .returning(|_, key, body, _| Ok(uploaded(key, body.len() as u64)));

        let linked = service(store, files)
            .link_image(&ctx(), 7, Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();

        let key = linked.image.unwrap();
        assert_ne!(key, "old-key");
        assert!(Uuid::parse_str(&key).is_ok());
    }

    #[tokio::test]
    async fn test_link_image_without_previous_skips_delete() {
        let mut store = MockArticleStore::new();
        store
            .expect_get_by_id()
            .returning(|id| Ok(Some(article(id, None))));
        store.expect_update().returning(|_, _| Ok(()));

        let mut files = MockFileGateway::new();
        files.expect_delete_object().never();
        files
            .expect_upload_object()
            .returning(|_, key, body, _| Ok(uploaded(key, body.len() as u64)));

        let linked = service(store, files)
            .link_image(&ctx(), 3, Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();
        assert!(linked.image.is_some());
    }

    #[tokio::test]
    async fn test_link_image_storage_failure_is_domain_error() {
        let mut store = MockArticleStore::new();
        store
            .expect_get_by_id()
            .returning(|id| Ok(Some(article(id, None))));
        store.expect_update().never();

        let mut files = MockFileGateway::new();
        files
            .expect_upload_object()
            .returning(|_, _, _, _| Err(AppError::Storage("connection refused".to_string())));

        let err = service(store, files)
            .link_image(&ctx(), 3, Bytes::from_static(b"gif"), "image/gif")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::StorageUnavailable)));
    }

    #[tokio::test]
    async fn test_get_image_reads_stored_key() {
        let mut store = MockArticleStore::new();
        store
            .expect_get_by_id()
            .returning(|id| Ok(Some(article(id, Some("cover")))));

        let mut files = MockFileGateway::new();
        files
            .expect_get_object()
            .withf(|bucket, key| bucket == BUCKET && key == "cover")
            .times(1)
            .returning(|_, _| {
                Ok(StoredObject {
                    body: Bytes::from_static(b"img"),
                    size: 3,
                    content_type: Some("image/png".to_string()),
                })
            });

        let object = service(store, files).get_image(&ctx(), 5).await.unwrap();
        assert_eq!(object.body, Bytes::from_static(b"img"));
        assert_eq!(object.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_get_image_without_image_fails() {
        let mut store = MockArticleStore::new();
        store
            .expect_get_by_id()
            .returning(|id| Ok(Some(article(id, None))));

        let mut files = MockFileGateway::new();
        files.expect_get_object().never();

        let err = service(store, files).get_image(&ctx(), 5).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::ArticleNotFound)));
    }

    #[tokio::test]
    async fn test_delete_article_ignores_image_cleanup_failure() {
        let mut store = MockArticleStore::new();
        store
            .expect_get_by_id()
            .returning(|id| Ok(Some(article(id, Some("img")))));
        store.expect_delete().with(eq(4)).returning(|_| Ok(true));

        let mut files = MockFileGateway::new();
        files
            .expect_delete_object()
            .returning(|_, _| Err(AppError::Storage("timeout".to_string())));

        service(store, files).delete_article(&ctx(), 4).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_article_returns_refreshed_row() {
        let mut store = MockArticleStore::new();
        store.expect_update().times(1).returning(|_, _| Ok(()));
        store.expect_get_by_id().returning(|id| {
            let mut a = article(id, None);
            a.header = "Renamed".to_string();
            Ok(Some(a))
        });

        let update = ArticleUpdate {
            header: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = service(store, MockFileGateway::new())
            .update_article(&ctx(), 2, update)
            .await
            .unwrap();
        assert_eq!(updated.header, "Renamed");
    }

    #[tokio::test]
    async fn test_link_categories_propagates_unknown_category() {
        let mut store = MockArticleStore::new();
        store
            .expect_link_categories()
            .withf(|id, ids| *id == 2 && ids == &vec![1, 99])
            .returning(|_, _| Err(DomainError::CategoryNotFound.into()));

        let err = service(store, MockFileGateway::new())
            .link_categories(&ctx(), 2, vec![1, 99])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::CategoryNotFound)));
    }
}
