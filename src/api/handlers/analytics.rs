use axum::{extract::State, Json};

use crate::api::extractors::{AuthUser, QueryParams, ValidatedJson};
use crate::api::requests::{AnalyticsRequest, PeriodQuery, TransTypeQuery};
use crate::api::responses::{ApiResponse, CategoriesSummaryResponse, DynamicsByPeriodResponse};
use crate::api::routes::AppState;
use crate::error::{AppError, Result};
use crate::models::Period;

/// Net cash flow per bucket. `?period=week|month|quarter|year` picks the
/// bucket size; unknown or missing periods fall back to `month`.
pub async fn dynamics_by_period(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    QueryParams(query): QueryParams<PeriodQuery>,
    ValidatedJson(request): ValidatedJson<AnalyticsRequest>,
) -> Result<Json<ApiResponse<DynamicsByPeriodResponse>>> {
    let period = Period::parse(query.period.as_deref());
    let points = state
        .analytics
        .dynamics_by_period(&ctx, request.date, period)
        .await?;
    Ok(Json(ApiResponse::success(points.into())))
}

/// Totals per category for `?trans_type=credit|debit`.
pub async fn categories_summary(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    QueryParams(query): QueryParams<TransTypeQuery>,
    ValidatedJson(request): ValidatedJson<AnalyticsRequest>,
) -> Result<Json<ApiResponse<CategoriesSummaryResponse>>> {
    let trans_type = query.required().map_err(AppError::Validation)?;
    let rows = state
        .analytics
        .categories_summary(&ctx, trans_type, request.date)
        .await?;
    Ok(Json(ApiResponse::success(rows.into())))
}
