pub mod analytics_repository;
pub mod article_repository;
pub mod category_repository;
pub mod transaction_repository;
pub mod user_repository;

pub use analytics_repository::AnalyticsRepository;
pub use article_repository::{ArticleRepository, ArticleStore};
pub use category_repository::{CategoryRepository, CategoryStore};
pub use transaction_repository::TransactionRepository;
pub use user_repository::{UserRepository, UserStore};

#[cfg(test)]
pub use article_repository::MockArticleStore;
#[cfg(test)]
pub use category_repository::MockCategoryStore;
#[cfg(test)]
pub use user_repository::MockUserStore;
