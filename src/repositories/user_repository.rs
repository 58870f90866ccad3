use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, DomainError, Result};
use crate::models::user::USER_ROLE;
use crate::models::{NewUser, RawUser};

/// Storage operations for logins and participant profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates the participant and its login atomically.
    async fn create_user(&self, user: NewUser) -> Result<()>;

    async fn get_raw_user_by_login(&self, login: &str) -> Result<Option<RawUser>>;
}

/// Postgres-backed user store.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(&self, user: NewUser) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let part_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO Participants (part_type, part_name, part_bank, part_account, part_inn, part_phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING part_id
            "#,
        )
        .bind(user.user_type)
        .bind(&user.name)
        .bind(&user.bank)
        .bind(&user.account)
        .bind(&user.inn)
        .bind(&user.phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        sqlx::query(
            r#"
            INSERT INTO Users (login_name, password, role, part_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&user.login)
        .bind(user.password_hash.as_str())
        .bind(USER_ROLE)
        .bind(part_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_constraint(e, Some(DomainError::UserAlreadyExists), None))?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(())
    }

    async fn get_raw_user_by_login(&self, login: &str) -> Result<Option<RawUser>> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT login_name, password, role
            FROM Users
            WHERE login_name = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(|(login, hash, role)| RawUser::from_row(login, hash, &role)))
    }
}
