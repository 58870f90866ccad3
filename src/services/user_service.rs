use std::sync::Arc;

use tracing::{info, warn, Instrument};

use crate::error::{AppError, DomainError, Result};
use crate::models::{AccessToken, PasswordHash, SubjectType, UserRegistration, UserType};
use crate::observability::{get_metrics, RequestContext};
use crate::repositories::UserStore;

use super::token::TokenIssuer;

/// Registration and login.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    hash_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenIssuer) -> Self {
        Self::with_hash_cost(store, tokens, PasswordHash::DEFAULT_COST)
    }

    pub fn with_hash_cost(store: Arc<dyn UserStore>, tokens: TokenIssuer, hash_cost: u32) -> Self {
        Self {
            store,
            tokens,
            hash_cost,
        }
    }

    pub fn subject_types(&self) -> Vec<SubjectType> {
        UserType::ALL.iter().copied().map(SubjectType::from).collect()
    }

    /// Creates the participant and its login, then issues a token for it.
    pub async fn register_user(
        &self,
        ctx: &RequestContext,
        registration: UserRegistration,
    ) -> Result<AccessToken> {
        async {
            if self
                .store
                .get_raw_user_by_login(&registration.login)
                .await?
                .is_some()
            {
                return Err(DomainError::UserAlreadyExists.into());
            }

            let password_hash = PasswordHash::new(&registration.password, self.hash_cost)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?;

            let login = registration.login.clone();
            let user_type = registration.user_type;
            self.store
                .create_user(registration.into_new_user(password_hash))
                .await?;

            let token = self.tokens.issue(&login, false)?;
            get_metrics().record_registration(user_type.as_str());
            info!(login = %login, user_type = user_type.as_str(), "user registered");
            Ok::<_, AppError>(token)
        }
        .instrument(ctx.span("register_user"))
        .await
    }

    /// Exchanges credentials for a token. Unknown logins and wrong
    /// passwords fail identically.
    pub async fn get_access_token(
        &self,
        ctx: &RequestContext,
        login: &str,
        password: &str,
    ) -> Result<AccessToken> {
        async {
            let raw = self.store.get_raw_user_by_login(login).await?;

            let Some(raw) = raw.filter(|raw| raw.password_hash.verify(password)) else {
                get_metrics().record_login(false);
                warn!(login, "login rejected");
                return Err(DomainError::WrongLoginOrPassword.into());
            };

            let token = self.tokens.issue(&raw.user.login, raw.user.is_admin)?;
            get_metrics().record_login(true);
            info!(login, is_admin = raw.user.is_admin, "access token issued");
            Ok::<_, AppError>(token)
        }
        .instrument(ctx.span("get_access_token"))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawUser;
    use crate::repositories::MockUserStore;
    use crate::services::token::test_keys;

    fn registration(login: &str) -> UserRegistration {
        UserRegistration {
            user_type: UserType::Individual,
            login: login.to_string(),
            name: "Ivan Petrov".to_string(),
            password: "s3cret-pass".to_string(),
            bank: "Sber".to_string(),
            account: "40817810099910004312".to_string(),
            inn: "77070838931".to_string(),
            phone: "+79991234567".to_string(),
        }
    }

    fn service(store: MockUserStore) -> UserService {
        UserService::with_hash_cost(Arc::new(store), test_keys::issuer(), 4)
    }

    fn ctx() -> RequestContext {
        RequestContext::new("test")
    }

    #[test]
    fn test_subject_types() {
        let types = service(MockUserStore::new()).subject_types();
        let codes: Vec<_> = types.iter().map(|t| t.subject_type).collect();
        assert_eq!(codes, vec!["INDIVIDUAL", "LEGAL"]);
    }

    #[tokio::test]
    async fn test_register_existing_login_fails() {
        let mut store = MockUserStore::new();
        store
            .expect_get_raw_user_by_login()
            .returning(|login| Ok(Some(RawUser::from_row(login.to_string(), String::new(), "user"))));
        store.expect_create_user().never();

        let err = service(store)
            .register_user(&ctx(), registration("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_issues_token() {
        let mut store = MockUserStore::new();
        store.expect_get_raw_user_by_login().returning(|_| Ok(None));
        store
            .expect_create_user()
            .withf(|user| {
                user.login == "alice"
                    && user.password_hash.as_str() != "s3cret-pass"
                    && user.password_hash.verify("s3cret-pass")
            })
            .times(1)
            .returning(|_| Ok(()));

        let token = service(store)
            .register_user(&ctx(), registration("alice"))
            .await
            .unwrap();

        let claims = test_keys::issuer().verify(&token.0).unwrap();
        assert_eq!(claims.sub, "alice");
        assert!(!claims.is_admin);
    }

    #[tokio::test]
    async fn test_login_with_valid_password() {
        let hash = PasswordHash::new("hunter22", 4).unwrap();
        let stored = hash.as_str().to_string();

        let mut store = MockUserStore::new();
        store.expect_get_raw_user_by_login().returning(move |login| {
            Ok(Some(RawUser::from_row(login.to_string(), stored.clone(), "admin")))
        });

        let token = service(store)
            .get_access_token(&ctx(), "root", "hunter22")
            .await
            .unwrap();

        let claims = test_keys::issuer().verify(&token.0).unwrap();
        assert_eq!(claims.sub, "root");
        assert!(claims.is_admin);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_fails() {
        let hash = PasswordHash::new("hunter22", 4).unwrap();
        let stored = hash.as_str().to_string();

        let mut store = MockUserStore::new();
        store.expect_get_raw_user_by_login().returning(move |login| {
            Ok(Some(RawUser::from_row(login.to_string(), stored.clone(), "user")))
        });

        let err = service(store)
            .get_access_token(&ctx(), "alice", "hunter23")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::WrongLoginOrPassword)));
    }

    #[tokio::test]
    async fn test_login_with_unknown_user_fails() {
        let mut store = MockUserStore::new();
        store.expect_get_raw_user_by_login().returning(|_| Ok(None));

        let err = service(store)
            .get_access_token(&ctx(), "ghost", "whatever")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::WrongLoginOrPassword)));
    }
}
