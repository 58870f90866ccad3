use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    AccessToken, Article, ArticleCategory, Category, CategoryRef, CategorySummary, DynamicsPoint,
    PaginatedEntities, PreparedTransaction, RestfulPaginatedEntities, TransType, Transaction,
    TransactionStatus, UserType,
};
use crate::observability::AggregatedHealth;

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(error: ErrorResponse) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<ValidationErrorDetail>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Validation error detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub health: AggregatedHealth,
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

impl From<AccessToken> for TokenResponse {
    fn from(token: AccessToken) -> Self {
        Self { token: token.0 }
    }
}

// ============================================================================
// Transactions
// ============================================================================

/// Transaction response DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub user_type: UserType,
    pub date_time: DateTime<Utc>,
    pub trans_type: TransType,
    pub amount: Decimal,
    pub category_id: Option<i64>,
    pub status_id: i64,
    pub sender_bank: String,
    pub receiver_inn: String,
    pub receiver_phone: String,
    pub comment: String,
    pub category_name: Option<String>,
    pub status_name: Option<String>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            user_type: tx.user_type,
            date_time: tx.date_time,
            trans_type: tx.trans_type,
            amount: tx.amount,
            category_id: tx.category_id,
            status_id: tx.status_id,
            sender_bank: tx.sender_bank,
            receiver_inn: tx.receiver_inn,
            receiver_phone: tx.receiver_phone,
            comment: tx.comment,
            category_name: tx.category_name,
            status_name: tx.status_name,
        }
    }
}

/// Prepared transaction response DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedTransactionResponse {
    pub id: i64,
    pub user_type: UserType,
    pub date_time: DateTime<Utc>,
    pub trans_type: TransType,
    pub amount: Decimal,
    pub category_id: Option<i64>,
    pub status_id: i64,
    pub sender_bank: String,
    pub receiver_inn: String,
    pub receiver_phone: String,
    pub comment: String,
}

impl From<PreparedTransaction> for PreparedTransactionResponse {
    fn from(tx: PreparedTransaction) -> Self {
        Self {
            id: tx.id,
            user_type: tx.user_type,
            date_time: tx.date_time,
            trans_type: tx.trans_type,
            amount: tx.amount,
            category_id: tx.category_id,
            status_id: tx.status_id,
            sender_bank: tx.sender_bank,
            receiver_inn: tx.receiver_inn,
            receiver_phone: tx.receiver_phone,
            comment: tx.comment,
        }
    }
}

/// Reference category with its transaction type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCategoryResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub trans_type: Option<TransType>,
}

impl From<CategoryRef> for TransactionCategoryResponse {
    fn from(category: CategoryRef) -> Self {
        Self {
            id: category.id,
            name: category.name,
            trans_type: category.trans_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatusResponse {
    pub id: i64,
    pub name: String,
}

impl From<TransactionStatus> for TransactionStatusResponse {
    fn from(status: TransactionStatus) -> Self {
        Self {
            id: status.id,
            name: status.name,
        }
    }
}

// ============================================================================
// Categories and articles
// ============================================================================

/// Category as shown to regular users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

impl From<ArticleCategory> for CategoryResponse {
    fn from(category: ArticleCategory) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

/// Category as shown to admins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAdminResponse {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryAdminResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub header: String,
    pub sub_header: String,
    pub description: String,
    pub image: Option<String>,
    pub categories: Vec<CategoryResponse>,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            header: article.header,
            sub_header: article.sub_header,
            description: article.description,
            image: article.image,
            categories: article.categories.into_iter().map(Into::into).collect(),
        }
    }
}

/// Page-numbered list response.
pub type PaginatedResponse<T> = PaginatedEntities<T>;

/// Offset list response with `limit=X&offset=Y` cursors.
pub type RestfulPaginatedResponse<T> = RestfulPaginatedEntities<T>;

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicsPointResponse {
    pub date: NaiveDate,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicsByPeriodResponse {
    pub data: Vec<DynamicsPointResponse>,
}

impl From<Vec<DynamicsPoint>> for DynamicsByPeriodResponse {
    fn from(points: Vec<DynamicsPoint>) -> Self {
        Self {
            data: points
                .into_iter()
                .map(|p| DynamicsPointResponse {
                    date: p.date,
                    value: p.value,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummaryResponse {
    pub category: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesSummaryResponse {
    pub data: Vec<CategorySummaryResponse>,
}

impl From<Vec<CategorySummary>> for CategoriesSummaryResponse {
    fn from(rows: Vec<CategorySummary>) -> Self {
        Self {
            data: rows
                .into_iter()
                .map(|r| CategorySummaryResponse {
                    category: r.category,
                    value: r.value,
                })
                .collect(),
        }
    }
}
