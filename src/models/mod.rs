pub mod analytics;
pub mod article;
pub mod category;
pub mod pagination;
pub mod transaction;
pub mod user;

pub use analytics::{BucketStep, CategorySummary, DateRange, DynamicsPoint, Period, NO_CATEGORY_LABEL};
pub use article::{Article, ArticleCategory, ArticleRow, ArticleSearch, ArticleUpdate, NewArticle};
pub use category::Category;
pub use pagination::{PaginatedEntities, RestfulPaginatedEntities};
pub use transaction::{
    CategoryRef, NewTransaction, PreparedTransaction, TransType, Transaction, TransactionFilter,
    TransactionStatus, UserType, STATUS_CONFIRMED_ID, STATUS_DELETED_ID, STATUS_NEW_ID,
};
pub use user::{
    AccessToken, Claims, NewUser, PasswordHash, RawUser, SubjectType, User, UserRegistration,
};
