use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::api::extractors::{AdminUser, AuthUser, PathParam, QueryParams, ValidatedJson};
use crate::api::requests::{
    ArticleSearchQuery, CreateArticleRequest, LinkCategoriesRequest, UpdateArticleRequest,
};
use crate::api::responses::{ApiResponse, ArticleResponse, RestfulPaginatedResponse};
use crate::api::routes::AppState;
use crate::error::{AppError, Result};

/// Multipart field holding the uploaded image.
pub const IMAGE_FIELD: &str = "file";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub async fn get_article(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<ApiResponse<ArticleResponse>>> {
    let article = state.articles.get_article(&ctx, id).await?;
    Ok(Json(ApiResponse::success(article.into())))
}

/// Article search. Accepts `limit`, `offset`, `search` and a repeatable
/// `category_id`; `next`/`previous` are ready-made query strings.
pub async fn search_articles(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    QueryParams(query): QueryParams<ArticleSearchQuery>,
) -> Result<Json<ApiResponse<RestfulPaginatedResponse<ArticleResponse>>>> {
    let page = state.articles.search_articles(&ctx, query.into()).await?;
    Ok(Json(ApiResponse::success(page.map(Into::into))))
}

pub async fn create_article(
    State(state): State<AppState>,
    AdminUser(ctx): AdminUser,
    ValidatedJson(request): ValidatedJson<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ArticleResponse>>)> {
    let article = state.articles.create_article(&ctx, request.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(article.into()))))
}

pub async fn update_article(
    State(state): State<AppState>,
    AdminUser(ctx): AdminUser,
    PathParam(id): PathParam<i64>,
    ValidatedJson(request): ValidatedJson<UpdateArticleRequest>,
) -> Result<Json<ApiResponse<ArticleResponse>>> {
    let article = state
        .articles
        .update_article(&ctx, id, request.into())
        .await?;
    Ok(Json(ApiResponse::success(article.into())))
}

pub async fn delete_article(
    State(state): State<AppState>,
    AdminUser(ctx): AdminUser,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    state.articles.delete_article(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replaces the article's categories with `categories_ids`.
pub async fn link_categories(
    State(state): State<AppState>,
    AdminUser(ctx): AdminUser,
    PathParam(id): PathParam<i64>,
    ValidatedJson(request): ValidatedJson<LinkCategoriesRequest>,
) -> Result<Json<ApiResponse<ArticleResponse>>> {
    let article = state
        .articles
        .link_categories(&ctx, id, request.categories_ids)
        .await?;
    Ok(Json(ApiResponse::success(article.into())))
}

/// Streams the stored article image back with its content type.
pub async fn download_image(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<impl IntoResponse> {
    let object = state.articles.get_image(&ctx, id).await?;
    let content_type = object
        .content_type
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
    Ok(([(header::CONTENT_TYPE, content_type)], object.body))
}

/// Uploads the multipart `file` field as the article image.
pub async fn upload_image(
    State(state): State<AppState>,
    AdminUser(ctx): AdminUser,
    PathParam(id): PathParam<i64>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ArticleResponse>>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {}", e)))?;

        if body.is_empty() {
            return Err(AppError::Validation("uploaded file is empty".to_string()));
        }

        let article = state
            .articles
            .link_image(&ctx, id, body, &content_type)
            .await?;
        return Ok(Json(ApiResponse::success(article.into())));
    }

    Err(AppError::Validation(format!(
        "multipart field '{}' is required",
        IMAGE_FIELD
    )))
}
