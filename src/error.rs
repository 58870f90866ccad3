use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::api::responses::{ApiResponse, ErrorResponse, ValidationErrorDetail};

/// Postgres SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for foreign key violations.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Business errors with a stable code and message pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Category not found")]
    CategoryNotFound,
    #[error("Category with this name already exists")]
    CategoryExists,
    #[error("Article not found")]
    ArticleNotFound,
    #[error("Transaction not found")]
    TransactionNotFound,
    #[error("Wrong login or password")]
    WrongLoginOrPassword,
    #[error("User is already registered")]
    UserAlreadyExists,
    #[error("Unable to reach the file storage")]
    StorageUnavailable,
}

impl DomainError {
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::CategoryNotFound => "CATEGORY_NOT_FOUND",
            DomainError::CategoryExists => "CATEGORY_EXISTS",
            DomainError::ArticleNotFound => "ARTICLE_NOT_FOUND",
            DomainError::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            DomainError::WrongLoginOrPassword => "CREDS_INVALID_ERROR",
            DomainError::UserAlreadyExists => "USER_EXISTS_ERROR",
            DomainError::StorageUnavailable => "S3_CONNECTION_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            DomainError::CategoryNotFound
            | DomainError::ArticleNotFound
            | DomainError::TransactionNotFound => StatusCode::NOT_FOUND,
            DomainError::CategoryExists
            | DomainError::WrongLoginOrPassword
            | DomainError::UserAlreadyExists => StatusCode::BAD_REQUEST,
            DomainError::StorageUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid request fields: {0}")]
    InvalidFields(#[from] ValidationErrors),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Maps a constraint violation to a domain error, keeping other database
    /// failures as they are.
    pub fn from_constraint(
        err: sqlx::Error,
        on_unique: Option<DomainError>,
        on_foreign_key: Option<DomainError>,
    ) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    if let Some(domain) = on_unique {
                        return AppError::Domain(domain);
                    }
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    if let Some(domain) = on_foreign_key {
                        return AppError::Domain(domain);
                    }
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidFields(_) | AppError::InvalidJson(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Domain(domain) => domain.status(),
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Storage(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the client-facing error body. Internal details never leave the
    /// server.
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            AppError::Validation(msg) => ErrorResponse::new("VALIDATION_ERROR", msg.clone()),
            AppError::InvalidFields(errors) => {
                ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                    .with_details(validation_details(errors))
            }
            AppError::InvalidJson(msg) => ErrorResponse::new("INVALID_JSON", msg.clone()),
            AppError::Domain(domain) => ErrorResponse::new(domain.code(), domain.to_string()),
            AppError::Unauthorized(msg) => ErrorResponse::new("UNAUTHORIZED", msg.clone()),
            AppError::Forbidden(msg) => ErrorResponse::new("FORBIDDEN", msg.clone()),
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Storage(_)
            | AppError::Config(_)
            | AppError::Internal(_) => {
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
            }
        }
    }
}

/// Flattens validator output into field-level messages, sorted by field.
pub fn validation_details(errors: &ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |e| ValidationErrorDetail {
                field: field.to_string(),
                message: match &e.message {
                    Some(message) => message.to_string(),
                    None => format!(
                        "Field validation for '{}' failed on the '{}' tag",
                        field, e.code
                    ),
                },
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = ApiResponse::<()>::error(self.to_error_response());
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct SampleForm {
        #[validate(length(min = 3))]
        name: String,
    }

    #[test]
    fn test_domain_error_codes_and_statuses() {
        assert_eq!(DomainError::CategoryExists.code(), "CATEGORY_EXISTS");
        assert_eq!(DomainError::CategoryExists.status(), StatusCode::BAD_REQUEST);
        assert_eq!(DomainError::ArticleNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(DomainError::TransactionNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            DomainError::WrongLoginOrPassword.code(),
            "CREDS_INVALID_ERROR"
        );
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.to_error_response();
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert!(!body.message.contains("10.0.0.3"));
    }

    #[test]
    fn test_validation_details() {
        let form = SampleForm {
            name: "ab".to_string(),
        };
        let errors = form.validate().unwrap_err();
        let err = AppError::from(errors);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let body = err.to_error_response();
        let details = body.details.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "name");
        assert_eq!(
            details[0].message,
            "Field validation for 'name' failed on the 'length' tag"
        );
    }

    #[test]
    fn test_non_constraint_database_error_is_kept() {
        let err = AppError::from_constraint(
            sqlx::Error::RowNotFound,
            Some(DomainError::CategoryExists),
            None,
        );
        assert!(matches!(err, AppError::Database(_)));
    }
}
