use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::value::StringDeserializer;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// Status assigned to freshly created transactions.
pub const STATUS_NEW_ID: i64 = 1;
/// Status given to a prepared transaction once confirmed.
pub const STATUS_CONFIRMED_ID: i64 = 2;
/// Status marking a soft-deleted transaction.
pub const STATUS_DELETED_ID: i64 = 6;

/// Unix seconds of `0001-01-01T00:00:00Z`, which clients send for an unset
/// date.
const ZERO_TIME_SECS: i64 = -62_135_596_800;

/// Legal form of the participant behind a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_type")]
pub enum UserType {
    /// Private individual.
    #[sqlx(rename = "ФЛ")]
    #[serde(rename = "ФЛ")]
    Individual,
    /// Legal entity.
    #[sqlx(rename = "ЮЛ")]
    #[serde(rename = "ЮЛ")]
    Legal,
}

impl UserType {
    pub const ALL: [UserType; 2] = [UserType::Individual, UserType::Legal];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Individual => "ФЛ",
            UserType::Legal => "ЮЛ",
        }
    }

    /// Machine-readable subject type shown to clients at registration.
    pub fn subject_type(&self) -> &'static str {
        match self {
            UserType::Individual => "INDIVIDUAL",
            UserType::Legal => "LEGAL",
        }
    }

    pub fn subject_name(&self) -> &'static str {
        match self {
            UserType::Individual => "Физическое лицо",
            UserType::Legal => "Юридическое лицо",
        }
    }
}

/// Direction of money movement. Credits count positive in aggregates,
/// debits negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "trans_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransType {
    Credit,
    Debit,
}

impl TransType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransType::Credit => "credit",
            TransType::Debit => "debit",
        }
    }
}

impl std::str::FromStr for TransType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" => Ok(TransType::Credit),
            "debit" => Ok(TransType::Debit),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

/// A recorded transaction joined with its category and status names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Transaction {
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
    pub category_type: Option<TransType>,
    pub status_name: Option<String>,
    pub status_description: Option<String>,
}

impl Transaction {
    pub fn is_deleted(&self) -> bool {
        self.status_id == STATUS_DELETED_ID
    }
}

/// A staged transaction awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PreparedTransaction {
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

/// Data required to insert a transaction or a prepared transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_type: UserType,
    pub date_time: Option<DateTime<Utc>>,
    pub trans_type: TransType,
    pub amount: Decimal,
    pub category_id: Option<i64>,
    pub status_id: Option<i64>,
    pub sender_bank: String,
    pub receiver_inn: String,
    pub receiver_phone: String,
    pub comment: String,
}

impl NewTransaction {
    /// Fills the timestamp and status defaults applied on insert.
    pub fn with_defaults(mut self, now: DateTime<Utc>) -> Self {
        if self.date_time.is_none() {
            self.date_time = Some(now);
        }
        if self.status_id.map_or(true, |id| id <= 0) {
            self.status_id = Some(STATUS_NEW_ID);
        }
        if self.category_id.is_some_and(|id| id <= 0) {
            self.category_id = None;
        }
        self
    }
}

/// Optional filters for transaction listing. Unset, empty and zero values
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionFilter {
    #[serde(deserialize_with = "blank_as_none")]
    pub user_type: Option<UserType>,
    #[serde(deserialize_with = "blank_as_none")]
    pub trans_type: Option<TransType>,
    pub sender_bank: Option<String>,
    pub receiver_inn: Option<String>,
    pub receiver_phone: Option<String>,
    pub category_id: Option<i64>,
    pub status_id: Option<i64>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    /// Drops blank strings, non-positive ids and zero timestamps so they never
    /// reach the query.
    pub fn normalized(self) -> Self {
        fn text(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        fn id(value: Option<i64>) -> Option<i64> {
            value.filter(|v| *v > 0)
        }
        fn time(value: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
            value.filter(|v| v.timestamp() != ZERO_TIME_SECS)
        }

        Self {
            user_type: self.user_type,
            trans_type: self.trans_type,
            sender_bank: text(self.sender_bank),
            receiver_inn: text(self.receiver_inn),
            receiver_phone: text(self.receiver_phone),
            category_id: id(self.category_id),
            status_id: id(self.status_id),
            date_from: time(self.date_from),
            date_to: time(self.date_to),
        }
    }
}

/// Reads an optional enum where an empty string means unset.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            T::deserialize(StringDeserializer::<D::Error>::new(raw)).map(Some)
        }
        _ => Ok(None),
    }
}

/// Reference row describing a transaction status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TransactionStatus {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Category as used by transactions: id, name and analytics type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub trans_type: Option<TransType>,
}
