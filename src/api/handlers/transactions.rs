use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::api::extractors::{AuthUser, PathParam, ValidatedJson};
use crate::api::requests::{CreateTransactionRequest, TransactionFilterRequest};
use crate::api::responses::{
    ApiResponse, PreparedTransactionResponse, TransactionCategoryResponse, TransactionResponse,
    TransactionStatusResponse,
};
use crate::api::routes::AppState;
use crate::error::Result;
use crate::models::TransactionFilter;

/// Lists every transaction, newest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>> {
    let transactions = state
        .transactions
        .list_transactions(&ctx, TransactionFilter::default())
        .await?;
    Ok(Json(ApiResponse::success(
        transactions.into_iter().map(Into::into).collect(),
    )))
}

/// Lists transactions matching the filter in the body.
pub async fn filter_transactions(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ValidatedJson(request): ValidatedJson<TransactionFilterRequest>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>> {
    let transactions = state
        .transactions
        .list_transactions(&ctx, request.filter)
        .await?;
    Ok(Json(ApiResponse::success(
        transactions.into_iter().map(Into::into).collect(),
    )))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ValidatedJson(request): ValidatedJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>)> {
    let created = state
        .transactions
        .create_transaction(&ctx, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created.into()))))
}

/// Soft-deletes a transaction.
pub async fn delete_transaction(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    state.transactions.delete_transaction(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_prepared(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<Json<ApiResponse<Vec<PreparedTransactionResponse>>>> {
    let prepared = state.transactions.list_prepared(&ctx).await?;
    Ok(Json(ApiResponse::success(
        prepared.into_iter().map(Into::into).collect(),
    )))
}

pub async fn create_prepared(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    ValidatedJson(request): ValidatedJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PreparedTransactionResponse>>)> {
    let created = state
        .transactions
        .create_prepared(&ctx, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created.into()))))
}

/// Confirms a prepared transaction.
pub async fn confirm_prepared(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>)> {
    let confirmed = state.transactions.confirm_prepared(&ctx, id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(confirmed.into()))))
}

pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<Json<ApiResponse<Vec<TransactionCategoryResponse>>>> {
    let categories = state.transactions.list_categories(&ctx).await?;
    Ok(Json(ApiResponse::success(
        categories.into_iter().map(Into::into).collect(),
    )))
}

pub async fn list_statuses(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> Result<Json<ApiResponse<Vec<TransactionStatusResponse>>>> {
    let statuses = state.transactions.list_statuses(&ctx).await?;
    Ok(Json(ApiResponse::success(
        statuses.into_iter().map(Into::into).collect(),
    )))
}
