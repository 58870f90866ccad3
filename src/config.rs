use serde::Deserialize;

use crate::observability::logging::{LogConfig, LogFormat};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Mounts the article and admin category routes.
    #[serde(default = "default_content_routes")]
    pub content_routes: bool,
}

/// RSA key pair used to sign and verify access tokens, in PEM form.
#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    pub private_key: String,
    pub public_key: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

#[derive(Clone, Deserialize)]
pub struct StorageSettings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub image_bucket: String,
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_content_routes() -> bool {
    true
}

fn default_token_ttl_hours() -> i64 {
    24
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        builder.build()?.try_deserialize()
    }
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            format: LogFormat::from(self.log_format.as_str()),
            ..LogConfig::default()
        }
    }
}

impl AuthSettings {
    /// Private key with escaped newlines restored, as env vars usually carry
    /// PEM on a single line.
    pub fn private_key_pem(&self) -> String {
        unescape_pem(&self.private_key)
    }

    pub fn public_key_pem(&self) -> String {
        unescape_pem(&self.public_key)
    }
}

impl StorageSettings {
    pub fn has_credentials(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty()
    }
}

fn unescape_pem(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key.len())
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

impl std::fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key", &crate::observability::logging::mask_sensitive(&self.access_key, 4))
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("image_bucket", &self.image_bucket)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_pem() {
        let auth = AuthSettings {
            private_key: "-----BEGIN-----\\nabc\\n-----END-----".to_string(),
            public_key: String::new(),
            token_ttl_hours: 24,
        };
        assert_eq!(auth.private_key_pem(), "-----BEGIN-----\nabc\n-----END-----");
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let storage = StorageSettings {
            endpoint: "http://minio:9000".to_string(),
            access_key: "minio_access".to_string(),
            secret_key: "super_secret".to_string(),
            region: "us-east-1".to_string(),
            image_bucket: "images".to_string(),
        };
        let rendered = format!("{:?}", storage);
        assert!(!rendered.contains("super_secret"));
        assert!(rendered.contains("images"));
    }

    #[test]
    fn test_application_address() {
        let app = ApplicationSettings {
            host: "0.0.0.0".to_string(),
            port: 8089,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            content_routes: true,
        };
        assert_eq!(app.address(), "0.0.0.0:8089");
        assert!(matches!(app.log_config().format, LogFormat::Json));
    }
}
