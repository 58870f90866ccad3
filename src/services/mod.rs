pub mod analytics_service;
pub mod article_service;
pub mod category_service;
pub mod token;
pub mod transaction_service;
pub mod user_service;

pub use analytics_service::AnalyticsService;
pub use article_service::ArticleService;
pub use category_service::CategoryService;
pub use token::TokenIssuer;
pub use transaction_service::TransactionService;
pub use user_service::UserService;
