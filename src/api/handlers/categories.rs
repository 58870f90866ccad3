use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::api::extractors::{AdminUser, AuthUser, PathParam, QueryParams, ValidatedJson};
use crate::api::requests::{clamp_window, CategoryListQuery, CategoryRequest, SearchQuery};
use crate::api::responses::{
    ApiResponse, CategoryAdminResponse, CategoryResponse, PaginatedResponse,
};
use crate::api::routes::AppState;
use crate::error::Result;

/// Category by id, as seen by any user.
pub async fn get_category(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<ApiResponse<CategoryResponse>>> {
    let category = state.categories.get_category(&ctx, id).await?;
    Ok(Json(ApiResponse::success(category.into())))
}

/// Category by id with timestamps.
pub async fn get_admin_category(
    State(state): State<AppState>,
    AdminUser(ctx): AdminUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<ApiResponse<CategoryAdminResponse>>> {
    let category = state.categories.get_category(&ctx, id).await?;
    Ok(Json(ApiResponse::success(category.into())))
}

/// Unpaginated name search.
pub async fn search_flat(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    QueryParams(query): QueryParams<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryResponse>>>> {
    let categories = state.categories.search_flat(&ctx, query.search).await?;
    Ok(Json(ApiResponse::success(
        categories.into_iter().map(Into::into).collect(),
    )))
}

/// Page-numbered name search for admins.
pub async fn search_paginated(
    State(state): State<AppState>,
    AdminUser(ctx): AdminUser,
    QueryParams(query): QueryParams<CategoryListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<CategoryAdminResponse>>>> {
    let (limit, offset) = clamp_window(query.limit, query.offset);
    let page = state
        .categories
        .search_paginated(&ctx, limit, offset, query.search)
        .await?;
    Ok(Json(ApiResponse::success(page.map(Into::into))))
}

pub async fn create_category(
    State(state): State<AppState>,
    AdminUser(ctx): AdminUser,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryAdminResponse>>)> {
    let category = state
        .categories
        .create_category(&ctx, &request.name, request.trans_type)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(category.into()))))
}

pub async fn update_category_name(
    State(state): State<AppState>,
    AdminUser(ctx): AdminUser,
    PathParam(id): PathParam<i64>,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> Result<Json<ApiResponse<CategoryAdminResponse>>> {
    let category = state
        .categories
        .update_category_name(&ctx, id, &request.name)
        .await?;
    Ok(Json(ApiResponse::success(category.into())))
}

pub async fn delete_category(
    State(state): State<AppState>,
    AdminUser(ctx): AdminUser,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    state.categories.delete_category(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
