use sqlx::PgPool;
use tracing::{debug, Instrument};

use crate::error::{AppError, Result};
use crate::models::{CategorySummary, DateRange, DynamicsPoint, Period, TransType};
use crate::observability::{get_metrics, LatencyTimer, RequestContext};
use crate::repositories::AnalyticsRepository;

/// Aggregations over transaction history.
#[derive(Clone)]
pub struct AnalyticsService {
    repo: AnalyticsRepository,
}

fn ensure_ordered(range: &DateRange) -> Result<()> {
    if range.is_ordered() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "date.from ({}) must not be later than date.to ({})",
            range.from, range.to
        )))
    }
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: AnalyticsRepository::new(pool),
        }
    }

    /// Net flow per bucket; every bucket in the range is present.
    pub async fn dynamics_by_period(
        &self,
        ctx: &RequestContext,
        range: DateRange,
        period: Period,
    ) -> Result<Vec<DynamicsPoint>> {
        ensure_ordered(&range)?;

        async {
            let timer = LatencyTimer::new();
            let points = self.repo.dynamics_by_period(&range, period).await?;
            get_metrics().record_analytics_query("dynamics", timer.elapsed_ms());
            debug!(buckets = points.len(), ?period, "dynamics computed");
            Ok::<_, AppError>(points)
        }
        .instrument(ctx.span("dynamics_by_period"))
        .await
    }

    pub async fn categories_summary(
        &self,
        ctx: &RequestContext,
        trans_type: TransType,
        range: DateRange,
    ) -> Result<Vec<CategorySummary>> {
        ensure_ordered(&range)?;

        async {
            let timer = LatencyTimer::new();
            let rows = self.repo.categories_summary(trans_type, &range).await?;
            get_metrics().record_analytics_query("categories_summary", timer.elapsed_ms());
            debug!(categories = rows.len(), trans_type = trans_type.as_str(), "summary computed");
            Ok::<_, AppError>(rows)
        }
        .instrument(ctx.span("categories_summary"))
        .await
    }
}
