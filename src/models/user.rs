use std::fmt::Display;

use bcrypt::{hash, verify, BcryptError};
use serde::{Deserialize, Serialize};

use super::transaction::UserType;

/// Role string that grants admin rights.
pub const ADMIN_ROLE: &str = "admin";
/// Role assigned at registration.
pub const USER_ROLE: &str = "user";

/// Authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub is_admin: bool,
}

/// User as stored, including the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUser {
    pub user: User,
    pub password_hash: PasswordHash,
}

impl RawUser {
    pub fn from_row(login: String, password_hash: String, role: &str) -> Self {
        Self {
            user: User {
                login,
                is_admin: role == ADMIN_ROLE,
            },
            password_hash: PasswordHash::from_stored(password_hash),
        }
    }
}

/// Everything needed to create a participant and its login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRegistration {
    pub user_type: UserType,
    pub login: String,
    pub name: String,
    pub password: String,
    pub bank: String,
    pub account: String,
    pub inn: String,
    pub phone: String,
}

/// Participant profile and login, with the password already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub user_type: UserType,
    pub login: String,
    pub name: String,
    pub password_hash: PasswordHash,
    pub bank: String,
    pub account: String,
    pub inn: String,
    pub phone: String,
}

impl UserRegistration {
    pub fn into_new_user(self, password_hash: PasswordHash) -> NewUser {
        NewUser {
            user_type: self.user_type,
            login: self.login,
            name: self.name,
            password_hash,
            bank: self.bank,
            account: self.account,
            inn: self.inn,
            phone: self.phone,
        }
    }
}

/// A bcrypt password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hashes `raw_password` with the given bcrypt `cost`.
    ///
    /// # Errors
    ///
    /// Returns an error if the password could not be hashed.
    pub fn new(raw_password: &str, cost: u32) -> Result<Self, BcryptError> {
        hash(raw_password, cost).map(Self)
    }

    /// Wraps a hash read back from the database.
    pub fn from_stored(raw_hash: String) -> Self {
        Self(raw_hash)
    }

    /// Checks `raw_password` against the hash. A malformed hash never matches.
    pub fn verify(&self, raw_password: &str) -> bool {
        verify(raw_password, &self.0).unwrap_or(false)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Subject type offered at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectType {
    pub subject_type: &'static str,
    pub subject_name: &'static str,
}

impl From<UserType> for SubjectType {
    fn from(user_type: UserType) -> Self {
        Self {
            subject_type: user_type.subject_type(),
            subject_name: user_type.subject_name(),
        }
    }
}

/// Signed JWT handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

impl Display for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Login of the token owner.
    pub sub: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user(&self) -> User {
        User {
            login: self.sub.clone(),
            is_admin: self.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies_original_password() {
        let hash = PasswordHash::new("hunter22", 4).unwrap();
        assert!(hash.verify("hunter22"));
        assert!(!hash.verify("hunter23"));
        assert_ne!(hash.as_str(), "hunter22");
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        let hash = PasswordHash::from_stored("not-a-bcrypt-hash".to_string());
        assert!(!hash.verify("not-a-bcrypt-hash"));
    }

    #[test]
    fn test_admin_derived_from_role() {
        let admin = RawUser::from_row("root".to_string(), String::new(), "admin");
        let user = RawUser::from_row("alice".to_string(), String::new(), "user");
        assert!(admin.user.is_admin);
        assert!(!user.user.is_admin);
    }

    #[test]
    fn test_subject_type_serialization() {
        let json = serde_json::to_value(SubjectType::from(UserType::Individual)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"subjectType": "INDIVIDUAL", "subjectName": "Физическое лицо"})
        );
    }

    #[test]
    fn test_password_hash_debug_hides_value() {
        let hash = PasswordHash::from_stored("$2b$04$secret".to_string());
        assert!(!format!("{:?}", hash).contains("secret"));
    }
}
