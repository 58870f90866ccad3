use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, Instrument};

use crate::error::{AppError, Result};
use crate::models::{
    CategoryRef, NewTransaction, PreparedTransaction, Transaction, TransactionFilter,
    TransactionStatus,
};
use crate::observability::{get_metrics, mask_sensitive, RequestContext};
use crate::repositories::TransactionRepository;

/// Service for recording, staging and listing transactions.
#[derive(Clone)]
pub struct TransactionService {
    repo: TransactionRepository,
}

impl TransactionService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: TransactionRepository::new(pool),
        }
    }

    /// Lists transactions matching the filter, newest first.
    pub async fn list_transactions(
        &self,
        ctx: &RequestContext,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let filter = filter.normalized();
        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
            if from > to {
                return Err(AppError::Validation(
                    "date_from must not be later than date_to".to_string(),
                ));
            }
        }

        async {
            let rows = self.repo.list(&filter).await?;
            info!(count = rows.len(), "transactions listed");
            Ok::<_, AppError>(rows)
        }
        .instrument(ctx.span("list_transactions"))
        .await
    }

    pub async fn list_prepared(&self, ctx: &RequestContext) -> Result<Vec<PreparedTransaction>> {
        self.repo
            .list_prepared()
            .instrument(ctx.span("list_prepared_transactions"))
            .await
    }

    /// Records a transaction. Missing timestamp and status get defaults.
    pub async fn create_transaction(
        &self,
        ctx: &RequestContext,
        new: NewTransaction,
    ) -> Result<Transaction> {
        let new = new.with_defaults(Utc::now());

        async {
            let created = self.repo.create(&new).await?;
            info!(
                transaction_id = created.id,
                trans_type = created.trans_type.as_str(),
                receiver_inn = %mask_sensitive(&created.receiver_inn, 2),
                "transaction created"
            );
            get_metrics().record_transaction_created(created.trans_type.as_str(), false);
            Ok::<_, AppError>(created)
        }
        .instrument(ctx.span("create_transaction"))
        .await
    }

    /// Stages a transaction for later confirmation.
    pub async fn create_prepared(
        &self,
        ctx: &RequestContext,
        new: NewTransaction,
    ) -> Result<PreparedTransaction> {
        let new = new.with_defaults(Utc::now());

        async {
            let created = self.repo.create_prepared(&new).await?;
            info!(prepared_id = created.id, "prepared transaction created");
            get_metrics().record_transaction_created(created.trans_type.as_str(), true);
            Ok::<_, AppError>(created)
        }
        .instrument(ctx.span("create_prepared_transaction"))
        .await
    }

    /// Promotes a staged transaction into the recorded transactions.
    pub async fn confirm_prepared(&self, ctx: &RequestContext, id: i64) -> Result<Transaction> {
        async {
            let confirmed = self.repo.confirm_prepared(id).await?;
            info!(prepared_id = id, transaction_id = confirmed.id, "prepared transaction confirmed");
            get_metrics().record_transaction_created(confirmed.trans_type.as_str(), false);
            Ok::<_, AppError>(confirmed)
        }
        .instrument(ctx.span("confirm_prepared_transaction"))
        .await
    }

    /// Soft-deletes a transaction by flipping its status.
    pub async fn delete_transaction(&self, ctx: &RequestContext, id: i64) -> Result<()> {
        async {
            self.repo.delete(id).await?;
            info!(transaction_id = id, "transaction marked deleted");
            get_metrics().record_transaction_deleted();
            Ok::<_, AppError>(())
        }
        .instrument(ctx.span("delete_transaction"))
        .await
    }

    pub async fn list_categories(&self, ctx: &RequestContext) -> Result<Vec<CategoryRef>> {
        self.repo
            .list_categories()
            .instrument(ctx.span("list_transaction_categories"))
            .await
    }

    pub async fn list_statuses(&self, ctx: &RequestContext) -> Result<Vec<TransactionStatus>> {
        self.repo
            .list_statuses()
            .instrument(ctx.span("list_transaction_statuses"))
            .await
    }
}
