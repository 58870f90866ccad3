use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::{
    CategorySummary, DateRange, DynamicsPoint, Period, TransType, NO_CATEGORY_LABEL,
    STATUS_DELETED_ID,
};

/// Read-only aggregations over transactions. Soft-deleted rows never count.
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Net flow per bucket over the inclusive range. Each bucket covers
    /// `[bucket, bucket + step)` clipped to the end of the range; buckets
    /// without transactions report zero.
    pub async fn dynamics_by_period(
        &self,
        range: &DateRange,
        period: Period,
    ) -> Result<Vec<DynamicsPoint>> {
        let rows = sqlx::query_as::<_, DynamicsPoint>(
            r#"
            WITH buckets AS (
                SELECT generate_series($1::date, $2::date, $3::interval)::date AS bucket
            )
            SELECT
                b.bucket AS date,
                COALESCE(SUM(
                    CASE
                        WHEN t.trans_type = 'credit' THEN t.amount
                        WHEN t.trans_type = 'debit' THEN -t.amount
                    END
                ), 0) AS value
            FROM buckets b
            LEFT JOIN transactions t
                ON t.date_time >= b.bucket
               AND t.date_time < LEAST(b.bucket + $3::interval, $4::date)
               AND t.status_id <> $5
            GROUP BY b.bucket
            ORDER BY b.bucket
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .bind(period.step().interval())
        .bind(range.end_exclusive())
        .bind(STATUS_DELETED_ID)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Totals per category of the given type, largest first. Uncategorized
    /// transactions are reported under a single label when present.
    pub async fn categories_summary(
        &self,
        trans_type: TransType,
        range: &DateRange,
    ) -> Result<Vec<CategorySummary>> {
        let rows = sqlx::query_as::<_, CategorySummary>(
            r#"
            SELECT c.name AS category, COALESCE(SUM(t.amount), 0) AS value
            FROM categories c
            LEFT JOIN transactions t
                ON t.category_id = c.id
               AND t.trans_type = $1
               AND t.date_time >= $2::date
               AND t.date_time < $3::date
               AND t.status_id <> $4
            WHERE c.type = $1
            GROUP BY c.id, c.name
            UNION ALL
            SELECT $5::text AS category, SUM(t.amount) AS value
            FROM transactions t
            WHERE t.category_id IS NULL
              AND t.trans_type = $1
              AND t.date_time >= $2::date
              AND t.date_time < $3::date
              AND t.status_id <> $4
            HAVING COUNT(*) > 0
            ORDER BY value DESC, category
            "#,
        )
        .bind(trans_type)
        .bind(range.from)
        .bind(range.end_exclusive())
        .bind(STATUS_DELETED_ID)
        .bind(NO_CATEGORY_LABEL)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }
}
