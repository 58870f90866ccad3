use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{
    ArticleSearch, ArticleUpdate, DateRange, NewArticle, NewTransaction, TransType,
    TransactionFilter, UserRegistration, UserType,
};

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 10;
/// Upper bound on page size.
pub const MAX_LIMIT: i64 = 100;

fn validate_digits(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("numeric"))
    }
}

/// `+` followed by 2 to 15 digits, the first non-zero.
fn validate_e164(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .strip_prefix('+')
        .filter(|digits| (2..=15).contains(&digits.len()))
        .filter(|digits| digits.chars().all(|c| c.is_ascii_digit()))
        .is_some_and(|digits| !digits.starts_with('0'));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("e164"))
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required"))
    } else {
        Ok(())
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegistrationRequest {
    #[serde(rename = "userType")]
    pub user_type: UserType,
    #[serde(rename = "loginName")]
    #[validate(length(min = 3, max = 50))]
    pub login: String,
    #[serde(rename = "partName")]
    #[validate(length(min = 3, max = 50))]
    pub name: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(custom = "validate_not_blank")]
    pub bank: String,
    #[validate(length(equal = 20), custom = "validate_digits")]
    pub account: String,
    #[validate(length(equal = 11), custom = "validate_digits")]
    pub inn: String,
    #[validate(custom = "validate_e164")]
    pub phone: String,
}

impl From<RegistrationRequest> for UserRegistration {
    fn from(request: RegistrationRequest) -> Self {
        Self {
            user_type: request.user_type,
            login: request.login,
            name: request.name,
            password: request.password,
            bank: request.bank,
            account: request.account,
            inn: request.inn,
            phone: request.phone,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(rename = "loginName")]
    #[validate(length(min = 3, max = 50))]
    pub login: String,
    #[validate(length(min = 6))]
    pub password: String,
}

// ============================================================================
// Transactions
// ============================================================================

/// Request to record a transaction or stage a prepared one.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    pub user_type: UserType,
    pub date_time: Option<DateTime<Utc>>,
    pub trans_type: TransType,
    pub amount: Decimal,
    pub category_id: Option<i64>,
    pub status_id: Option<i64>,
    #[validate(length(max = 255))]
    #[serde(default)]
    pub sender_bank: String,
    #[validate(length(max = 12))]
    #[serde(default)]
    pub receiver_inn: String,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub receiver_phone: String,
    #[serde(default)]
    pub comment: String,
}

impl From<CreateTransactionRequest> for NewTransaction {
    fn from(request: CreateTransactionRequest) -> Self {
        Self {
            user_type: request.user_type,
            date_time: request.date_time,
            trans_type: request.trans_type,
            amount: request.amount,
            category_id: request.category_id,
            status_id: request.status_id,
            sender_bank: request.sender_bank,
            receiver_inn: request.receiver_inn,
            receiver_phone: request.receiver_phone,
            comment: request.comment,
        }
    }
}

/// Filter accepted by `POST /transactions/filter`; an empty body lists all.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TransactionFilterRequest {
    #[serde(flatten)]
    pub filter: TransactionFilter,
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalyticsRequest {
    pub date: DateRange,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransTypeQuery {
    pub trans_type: Option<String>,
}

impl TransTypeQuery {
    /// The transaction type is mandatory for the categories summary.
    pub fn required(&self) -> Result<TransType, String> {
        self.trans_type
            .as_deref()
            .ok_or_else(|| "trans_type parameter is required".to_string())?
            .parse()
    }
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 3))]
    pub name: String,
    #[serde(rename = "type", default)]
    pub trans_type: Option<TransType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Clamps a client-supplied window into a sane range.
pub fn clamp_window(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_LIMIT), offset.max(0))
}

// ============================================================================
// Articles
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 2))]
    pub header: String,
    #[validate(length(min = 2))]
    pub sub_header: String,
    #[validate(length(min = 5))]
    pub description: String,
}

impl From<CreateArticleRequest> for NewArticle {
    fn from(request: CreateArticleRequest) -> Self {
        Self {
            header: request.header,
            sub_header: request.sub_header,
            description: request.description,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateArticleRequest {
    #[validate(length(min = 2))]
    pub header: Option<String>,
    #[validate(length(min = 2))]
    pub sub_header: Option<String>,
    #[validate(length(min = 5))]
    pub description: Option<String>,
}

impl From<UpdateArticleRequest> for ArticleUpdate {
    fn from(request: UpdateArticleRequest) -> Self {
        Self {
            header: request.header,
            image: None,
            sub_header: request.sub_header,
            description: request.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LinkCategoriesRequest {
    pub categories_ids: Vec<i64>,
}

/// Article listing query. `category_id` may repeat.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleSearchQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub search: Option<String>,
    #[serde(default, rename = "category_id")]
    pub category_ids: Vec<i64>,
}

impl From<ArticleSearchQuery> for ArticleSearch {
    fn from(query: ArticleSearchQuery) -> Self {
        let (limit, offset) = clamp_window(query.limit, query.offset);
        Self {
            limit,
            offset,
            search: query.search,
            category_ids: query.category_ids,
        }
    }
}
