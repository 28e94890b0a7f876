//! Tintworks configuration system.
//!
//! A single TOML file with serde defaults for every field, so an empty file
//! (or no file at all) yields a runnable development configuration. Secrets
//! are resolved from the environment first, then the file, so deployments
//! never have to write keys to disk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TintworksError};
use crate::types::ServiceItem;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TintworksConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Fixed service catalog. Defaults to the two builtin tint packages.
    #[serde(default = "default_catalog")]
    pub catalog: Vec<ServiceItem>,
}

impl Default for TintworksConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            payments: PaymentsConfig::default(),
            mail: MailConfig::default(),
            store: StoreConfig::default(),
            identity: IdentityConfig::default(),
            catalog: default_catalog(),
        }
    }
}

impl TintworksConfig {
    /// Load config from the default path (~/.tintworks/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TintworksError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| TintworksError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| TintworksError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tintworks")
            .join("config.toml")
    }

    /// Get the Tintworks home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tintworks")
    }
}

fn default_catalog() -> Vec<ServiceItem> {
    vec![
        ServiceItem {
            id: "service_std".into(),
            name: "Standard Tint".into(),
            price_cents: 20_000,
            price_id: "price_standard_tint".into(),
            description: "Basic tinting for all windows.".into(),
        },
        ServiceItem {
            id: "service_prm".into(),
            name: "Premium Tint".into(),
            price_cents: 35_000,
            price_id: "price_premium_tint".into(),
            description: "High-quality ceramic tint for maximum heat rejection and UV protection."
                .into(),
        },
    ]
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Payment processor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Secret API key. Overridden by STRIPE_SECRET_KEY when set.
    #[serde(default)]
    pub secret_key: String,
    /// Shared webhook signing secret. Overridden by STRIPE_WEBHOOK_SECRET.
    #[serde(default)]
    pub webhook_secret: String,
    #[serde(default = "default_payments_base")]
    pub api_base: String,
}

fn default_payments_base() -> String {
    "https://api.stripe.com".into()
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            webhook_secret: String::new(),
            api_base: default_payments_base(),
        }
    }
}

impl PaymentsConfig {
    /// Resolve the API key: environment first, then the config file.
    pub fn resolve_secret_key(&self) -> String {
        std::env::var("STRIPE_SECRET_KEY").unwrap_or_else(|_| self.secret_key.clone())
    }

    /// Resolve the webhook signing secret: environment first, then the file.
    pub fn resolve_webhook_secret(&self) -> String {
        std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| self.webhook_secret.clone())
    }
}

/// Outbound SMTP configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    /// Overridden by SMTP_PASSWORD when set.
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".into()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_from_address() -> String {
    "tinting-app@proton.me".into()
}
fn default_from_name() -> String {
    "Tintworks".into()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_address: default_from_address(),
            from_name: default_from_name(),
        }
    }
}

impl MailConfig {
    pub fn resolve_password(&self) -> String {
        std::env::var("SMTP_PASSWORD").unwrap_or_else(|_| self.password.clone())
    }
}

/// Order store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. Tilde-expanded at open time.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "~/.tintworks/orders.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl StoreConfig {
    pub fn resolved_db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.db_path).to_string())
    }
}

/// Identity provider configuration.
///
/// `backend = "http"` talks to the hosted provider; `backend = "static"`
/// serves the `[identity.users]` table below it, for development and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_identity_backend")]
    pub backend: String,
    #[serde(default)]
    pub base_url: String,
    /// Overridden by IDENTITY_API_KEY when set.
    #[serde(default)]
    pub api_key: String,
    /// Shared secret for the signup webhook. Overridden by SIGNUP_WEBHOOK_SECRET.
    #[serde(default)]
    pub signup_webhook_secret: String,
    /// Static backend only: token -> user entries.
    #[serde(default)]
    pub users: Vec<StaticUser>,
}

fn default_identity_backend() -> String {
    "http".into()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            backend: default_identity_backend(),
            base_url: String::new(),
            api_key: String::new(),
            signup_webhook_secret: String::new(),
            users: vec![],
        }
    }
}

impl IdentityConfig {
    pub fn resolve_api_key(&self) -> String {
        std::env::var("IDENTITY_API_KEY").unwrap_or_else(|_| self.api_key.clone())
    }

    pub fn resolve_signup_webhook_secret(&self) -> String {
        std::env::var("SIGNUP_WEBHOOK_SECRET")
            .unwrap_or_else(|_| self.signup_webhook_secret.clone())
    }
}

/// One entry in the static identity backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticUser {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TintworksConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.payments.api_base, "https://api.stripe.com");
        assert_eq!(config.mail.from_address, "tinting-app@proton.me");
        assert_eq!(config.catalog.len(), 2);
        assert_eq!(config.catalog[0].name, "Standard Tint");
        assert_eq!(config.catalog[0].price_cents, 20_000);
        assert_eq!(config.catalog[1].price_cents, 35_000);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [server]
            port = 8080
            host = "0.0.0.0"

            [payments]
            secret_key = "sk_test_123"
            webhook_secret = "whsec_456"

            [[catalog]]
            id = "service_fleet"
            name = "Fleet Package"
            price_cents = 90000
            price_id = "price_fleet"
            description = "Tinting for a whole fleet."
        "#;

        let config: TintworksConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.payments.secret_key, "sk_test_123");
        assert_eq!(config.catalog.len(), 1);
        assert_eq!(config.catalog[0].id, "service_fleet");
        // Untouched sections keep their defaults
        assert_eq!(config.mail.smtp_port, 587);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let toml_str = "";
        let config: TintworksConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.identity.backend, "http");
        assert_eq!(config.catalog.len(), 2);
    }

    #[test]
    fn test_static_identity_users() {
        let toml_str = r#"
            [identity]
            backend = "static"

            [[identity.users]]
            token = "dev-token"
            user_id = "user-1"
            email = "dev@example.com"
        "#;
        let config: TintworksConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.identity.backend, "static");
        assert_eq!(config.identity.users.len(), 1);
        assert_eq!(config.identity.users[0].user_id, "user-1");
        assert!(config.identity.users[0].display_name.is_empty());
    }

    #[test]
    fn test_home_dir() {
        let home = TintworksConfig::home_dir();
        assert!(home.to_string_lossy().contains("tintworks"));
    }
}
