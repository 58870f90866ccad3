use axum::{extract::State, http::StatusCode, Json};

use crate::api::extractors::ValidatedJson;
use crate::api::requests::{LoginRequest, RegistrationRequest};
use crate::api::responses::{ApiResponse, TokenResponse};
use crate::api::routes::AppState;
use crate::error::Result;
use crate::models::SubjectType;
use crate::observability::RequestContext;

/// Lists the subject types a participant can register as.
pub async fn subject_types(State(state): State<AppState>) -> Json<ApiResponse<Vec<SubjectType>>> {
    Json(ApiResponse::success(state.users.subject_types()))
}

/// Registers a participant and returns its first access token.
pub async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(request): ValidatedJson<RegistrationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>)> {
    let token = state.users.register_user(&ctx, request.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(token.into()))))
}

/// Exchanges login and password for an access token.
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>> {
    let token = state
        .users
        .get_access_token(&ctx, &request.login, &request.password)
        .await?;
    Ok(Json(ApiResponse::success(token.into())))
}
