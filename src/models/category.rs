use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::transaction::TransType;

/// A category shared by transactions and articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    pub trans_type: Option<TransType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Returns true when renaming to `name` would change nothing.
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name
    }
}
