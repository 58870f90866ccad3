use axum::{
    async_trait,
    extract::{FromRef, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json, RequestPartsExt,
};
use axum_extra::{
    extract::Query,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::observability::RequestContext;
use crate::services::TokenIssuer;

/// Header carrying the request id, set or propagated by the router.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn request_id(parts: &Parts) -> String {
    parts
        .headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Anonymous request context carrying only the request id.
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestContext::new(request_id(parts)))
    }
}

/// Request context of a caller holding a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    TokenIssuer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized("missing bearer token".to_string()))?;

        let tokens = TokenIssuer::from_ref(state);
        let claims = tokens.verify(bearer.token())?;
        let user = claims.user();

        Ok(AuthUser(
            RequestContext::new(request_id(parts)).with_user(user.login, user.is_admin),
        ))
    }
}

/// Request context of an authenticated admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub RequestContext);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    TokenIssuer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(ctx) = AuthUser::from_request_parts(parts, state).await?;
        if !ctx.is_admin {
            return Err(AppError::Forbidden("admin role required".to_string()));
        }
        Ok(AdminUser(ctx))
    }
}

/// JSON body that is deserialized and then checked with `validator`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidJson(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Path parameters. A malformed segment is a `VALIDATION_ERROR`.
#[derive(Debug, Clone, Copy)]
pub struct PathParam<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(PathParam(value))
    }
}

/// Query string, with repeated keys collected into sequences.
#[derive(Debug, Clone, Default)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.to_string()))?;
        Ok(QueryParams(value))
    }
}
