use crate::error::{AppError, DomainError, Result, FOREIGN_KEY_VIOLATION};
use crate::models::{
    CategoryRef, NewTransaction, PreparedTransaction, Transaction, TransactionFilter,
    TransactionStatus, STATUS_CONFIRMED_ID, STATUS_DELETED_ID,
};
use sqlx::{PgPool, Postgres, QueryBuilder};

const TRANSACTION_SELECT: &str = r#"
    SELECT t.id, t.user_type, t.date_time, t.trans_type, t.amount, t.category_id, t.status_id,
           t.sender_bank, t.receiver_inn, t.receiver_phone, t.comment,
           c.name AS category_name, c.type AS category_type,
           s.name AS status_name, s.description AS status_description
    FROM transactions t
    LEFT JOIN categories c ON c.id = t.category_id
    LEFT JOIN transaction_statuses s ON s.id = t.status_id
    WHERE 1 = 1"#;

const PREPARED_COLUMNS: &str = "id, user_type, date_time, trans_type, amount, category_id, status_id, sender_bank, receiver_inn, receiver_phone, comment";

/// Builds the filtered listing query. Only set filter fields produce a
/// predicate.
pub fn build_list_query(filter: &TransactionFilter) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new(TRANSACTION_SELECT);

    if let Some(user_type) = filter.user_type {
        builder.push(" AND t.user_type = ").push_bind(user_type);
    }
    if let Some(trans_type) = filter.trans_type {
        builder.push(" AND t.trans_type = ").push_bind(trans_type);
    }
    if let Some(sender_bank) = &filter.sender_bank {
        builder.push(" AND t.sender_bank = ").push_bind(sender_bank);
    }
    if let Some(receiver_inn) = &filter.receiver_inn {
        builder.push(" AND t.receiver_inn = ").push_bind(receiver_inn);
    }
    if let Some(receiver_phone) = &filter.receiver_phone {
        builder.push(" AND t.receiver_phone = ").push_bind(receiver_phone);
    }
    if let Some(category_id) = filter.category_id {
        builder.push(" AND t.category_id = ").push_bind(category_id);
    }
    if let Some(status_id) = filter.status_id {
        builder.push(" AND t.status_id = ").push_bind(status_id);
    }
    if let Some(date_from) = filter.date_from {
        builder.push(" AND t.date_time >= ").push_bind(date_from);
    }
    if let Some(date_to) = filter.date_to {
        builder.push(" AND t.date_time <= ").push_bind(date_to);
    }

    builder.push(" ORDER BY t.date_time DESC, t.id DESC");
    builder
}

const STATUS_FOREIGN_KEY_SUFFIX: &str = "_status_id_fkey";

/// Maps a failed insert. The status and category foreign keys share the
/// same SQLSTATE, so the constraint name decides which error the caller sees.
fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if is_status_violation(db_err.code().as_deref(), db_err.constraint()) {
            return AppError::Validation("unknown status_id".to_string());
        }
    }
    AppError::from_constraint(err, None, Some(DomainError::CategoryNotFound))
}

fn is_status_violation(code: Option<&str>, constraint: Option<&str>) -> bool {
    code == Some(FOREIGN_KEY_VIOLATION)
        && constraint.is_some_and(|name| name.ends_with(STATUS_FOREIGN_KEY_SUFFIX))
}

/// Repository for transactions, staged transactions and their reference data.
#[derive(Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists transactions matching the filter, newest first.
    pub async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let rows = build_list_query(filter)
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Finds a transaction by its id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Transaction>> {
        let mut builder = QueryBuilder::<Postgres>::new(TRANSACTION_SELECT);
        builder.push(" AND t.id = ").push_bind(id);

        let row = builder
            .build_query_as::<Transaction>()
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Inserts a transaction and returns it with joined names.
    pub async fn create(&self, new: &NewTransaction) -> Result<Transaction> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (user_type, date_time, trans_type, amount, category_id, status_id, sender_bank, receiver_inn, receiver_phone, comment)
            VALUES ($1, COALESCE($2, NOW()), $3, $4, $5, COALESCE($6, 1), $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(new.user_type)
        .bind(new.date_time)
        .bind(new.trans_type)
        .bind(new.amount)
        .bind(new.category_id)
        .bind(new.status_id)
        .bind(&new.sender_bank)
        .bind(&new.receiver_inn)
        .bind(&new.receiver_phone)
        .bind(&new.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("transaction {} vanished after insert", id)))
    }

    /// Lists staged transactions, newest first.
    pub async fn list_prepared(&self) -> Result<Vec<PreparedTransaction>> {
        let rows = sqlx::query_as::<_, PreparedTransaction>(&format!(
            "SELECT {} FROM prepared_transactions ORDER BY date_time DESC, id DESC",
            PREPARED_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Inserts a staged transaction.
    pub async fn create_prepared(&self, new: &NewTransaction) -> Result<PreparedTransaction> {
        let row = sqlx::query_as::<_, PreparedTransaction>(&format!(
            r#"
            INSERT INTO prepared_transactions (user_type, date_time, trans_type, amount, category_id, status_id, sender_bank, receiver_inn, receiver_phone, comment)
            VALUES ($1, COALESCE($2, NOW()), $3, $4, $5, COALESCE($6, 1), $7, $8, $9, $10)
            RETURNING {}
            "#,
            PREPARED_COLUMNS
        ))
        .bind(new.user_type)
        .bind(new.date_time)
        .bind(new.trans_type)
        .bind(new.amount)
        .bind(new.category_id)
        .bind(new.status_id)
        .bind(&new.sender_bank)
        .bind(&new.receiver_inn)
        .bind(&new.receiver_phone)
        .bind(&new.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row)
    }

    /// Moves a staged transaction into `transactions` as confirmed. Removal and
    /// insert commit together.
    pub async fn confirm_prepared(&self, id: i64) -> Result<Transaction> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let staged = sqlx::query_as::<_, PreparedTransaction>(&format!(
            "DELETE FROM prepared_transactions WHERE id = $1 RETURNING {}",
            PREPARED_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?
        .ok_or(DomainError::TransactionNotFound)?;

        let new_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (user_type, date_time, trans_type, amount, category_id, status_id, sender_bank, receiver_inn, receiver_phone, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(staged.user_type)
        .bind(staged.date_time)
        .bind(staged.trans_type)
        .bind(staged.amount)
        .bind(staged.category_id)
        .bind(STATUS_CONFIRMED_ID)
        .bind(&staged.sender_bank)
        .bind(&staged.receiver_inn)
        .bind(&staged.receiver_phone)
        .bind(&staged.comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await.map_err(AppError::Database)?;

        self.find_by_id(new_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("transaction {} vanished after confirm", new_id)))
    }

    /// Marks a transaction deleted. Absent and already deleted rows are
    /// reported as not found.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status_id = $1
            WHERE id = $2 AND status_id <> $1
            "#,
        )
        .bind(STATUS_DELETED_ID)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TransactionNotFound.into());
        }

        Ok(())
    }

    /// Lists categories available to transactions.
    pub async fn list_categories(&self) -> Result<Vec<CategoryRef>> {
        let rows = sqlx::query_as::<_, CategoryRef>(
            r#"
            SELECT id, name, type
            FROM categories
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Lists transaction statuses.
    pub async fn list_statuses(&self) -> Result<Vec<TransactionStatus>> {
        let rows = sqlx::query_as::<_, TransactionStatus>(
            r#"
            SELECT id, name, description
            FROM transaction_statuses
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }
}
