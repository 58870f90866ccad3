use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config::AuthSettings;
use crate::error::{AppError, Result};
use crate::models::{AccessToken, Claims};

/// Signs and verifies RS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Builds an issuer from PEM encoded RSA keys.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either key cannot be parsed.
    pub fn from_pem(private_pem: &str, public_pem: &str, ttl: Duration) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("invalid token signing key: {}", e))
        })?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("invalid token verification key: {}", e))
        })?;

        Ok(Self {
            encoding_key,
            decoding_key,
            ttl,
        })
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self> {
        Self::from_pem(
            &settings.private_key_pem(),
            &settings.public_key_pem(),
            Duration::hours(settings.token_ttl_hours),
        )
    }

    pub fn issue(&self, login: &str, is_admin: bool) -> Result<AccessToken> {
        let now = Utc::now();
        let claims = Claims {
            sub: login.to_string(),
            is_admin,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map(AccessToken)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {}", e)))
    }

    /// Checks signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::RS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("invalid token: {}", e)))
    }
}
