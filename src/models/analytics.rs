use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::postgres::types::PgInterval;
use sqlx::FromRow;

/// Label used for transactions without a category.
pub const NO_CATEGORY_LABEL: &str = "No category";

/// Reporting period that selects the bucket step of the dynamics series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

/// Step between consecutive dynamics buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStep {
    Day,
    Week,
    Month,
}

impl Period {
    /// Parses the `period` query value. Missing or unknown values fall back
    /// to the default period, whose step is one day.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("week") => Period::Week,
            Some("quarter") => Period::Quarter,
            Some("year") => Period::Year,
            _ => Period::Month,
        }
    }

    pub fn step(&self) -> BucketStep {
        match self {
            Period::Week | Period::Month => BucketStep::Day,
            Period::Quarter => BucketStep::Week,
            Period::Year => BucketStep::Month,
        }
    }
}

impl BucketStep {
    pub fn interval(&self) -> PgInterval {
        let (months, days) = match self {
            BucketStep::Day => (0, 1),
            BucketStep::Week => (0, 7),
            BucketStep::Month => (1, 0),
        };
        PgInterval {
            months,
            days,
            microseconds: 0,
        }
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(deserialize_with = "deserialize_date")]
    pub from: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn is_ordered(&self) -> bool {
        self.from <= self.to
    }

    /// First day after the range, used as an exclusive upper bound.
    pub fn end_exclusive(&self) -> NaiveDate {
        self.to.succ_opt().unwrap_or(self.to)
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| {
        de::Error::custom(format!(
            "invalid date '{}', expected YYYY-MM-DD or RFC 3339",
            raw
        ))
    })
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Net flow for one bucket of the dynamics series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DynamicsPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Total amount for one category within a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CategorySummary {
    pub category: String,
    pub value: Decimal,
}
