//! # Tintworks Identity
//!
//! The consumed authentication interface: verify a bearer token to a user,
//! and look up a user's email address. Two backends sit behind one trait —
//! the hosted HTTP provider for production, and a config-seeded static
//! table for development and handler tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use tintworks_core::config::IdentityConfig;
use tintworks_core::error::{Result, TintworksError};

/// A verified caller.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// The identity provider as the glue code consumes it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer token. An unknown or expired token is
    /// `Unauthenticated`.
    async fn verify_token(&self, token: &str) -> Result<AuthedUser>;

    /// Look up a user's email. `Ok(None)` when the user exists without one.
    async fn lookup_email(&self, user_id: &str) -> Result<Option<String>>;
}

/// Build the configured backend.
pub fn from_config(config: &IdentityConfig) -> Result<Arc<dyn IdentityProvider>> {
    match config.backend.as_str() {
        "static" => Ok(Arc::new(StaticIdentityProvider::from_config(config))),
        "http" => {
            if config.base_url.is_empty() {
                return Err(TintworksError::Config(
                    "[identity].base_url is required for the http backend".into(),
                ));
            }
            Ok(Arc::new(HttpIdentityProvider::new(
                &config.base_url,
                &config.resolve_api_key(),
            )))
        }
        other => Err(TintworksError::Config(format!(
            "Unknown identity backend '{other}' (expected 'http' or 'static')"
        ))),
    }
}

// ── HTTP backend ──────────────────────────────

/// Hosted identity provider over HTTPS.
pub struct HttpIdentityProvider {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct VerifyResponse {
    user_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct UserResponse {
    #[serde(default)]
    email: Option<String>,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<AuthedUser> {
        let url = format!("{}/v1/tokens/verify", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| TintworksError::Identity(format!("Token verify request: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(TintworksError::Unauthenticated(
                "Token rejected by identity provider".into(),
            ));
        }
        if !status.is_success() {
            return Err(TintworksError::Identity(format!(
                "Token verify returned {status}"
            )));
        }

        let verified: VerifyResponse = response
            .json()
            .await
            .map_err(|e| TintworksError::Identity(format!("Token verify decode: {e}")))?;
        Ok(AuthedUser {
            user_id: verified.user_id,
            email: verified.email,
            display_name: verified.display_name,
        })
    }

    async fn lookup_email(&self, user_id: &str) -> Result<Option<String>> {
        let url = format!("{}/v1/users/{user_id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| TintworksError::Identity(format!("User lookup request: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(TintworksError::Identity(format!(
                "User lookup returned {}",
                response.status()
            )));
        }

        let user: UserResponse = response
            .json()
            .await
            .map_err(|e| TintworksError::Identity(format!("User lookup decode: {e}")))?;
        Ok(user.email)
    }
}

// ── Static backend ──────────────────────────────

/// In-memory token table, seeded from `[identity.users]` in the config.
pub struct StaticIdentityProvider {
    by_token: HashMap<String, AuthedUser>,
    by_user_id: HashMap<String, Option<String>>,
}

impl StaticIdentityProvider {
    pub fn from_config(config: &IdentityConfig) -> Self {
        let mut by_token = HashMap::new();
        let mut by_user_id = HashMap::new();
        for user in &config.users {
            let email = (!user.email.is_empty()).then(|| user.email.clone());
            let display_name = (!user.display_name.is_empty()).then(|| user.display_name.clone());
            by_user_id.insert(user.user_id.clone(), email.clone());
            by_token.insert(
                user.token.clone(),
                AuthedUser {
                    user_id: user.user_id.clone(),
                    email,
                    display_name,
                },
            );
        }
        Self {
            by_token,
            by_user_id,
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<AuthedUser> {
        self.by_token
            .get(token)
            .cloned()
            .ok_or_else(|| TintworksError::Unauthenticated("Unknown token".into()))
    }

    async fn lookup_email(&self, user_id: &str) -> Result<Option<String>> {
        match self.by_user_id.get(user_id) {
            Some(email) => Ok(email.clone()),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tintworks_core::config::StaticUser;

    fn static_config() -> IdentityConfig {
        IdentityConfig {
            backend: "static".into(),
            base_url: String::new(),
            api_key: String::new(),
            signup_webhook_secret: String::new(),
            users: vec![
                StaticUser {
                    token: "tok-ada".into(),
                    user_id: "user-ada".into(),
                    email: "ada@example.com".into(),
                    display_name: "Ada".into(),
                },
                StaticUser {
                    token: "tok-noemail".into(),
                    user_id: "user-noemail".into(),
                    email: String::new(),
                    display_name: String::new(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_static_verify_token() {
        let provider = StaticIdentityProvider::from_config(&static_config());
        let user = provider.verify_token("tok-ada").await.unwrap();
        assert_eq!(user.user_id, "user-ada");
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_static_unknown_token_is_unauthenticated() {
        let provider = StaticIdentityProvider::from_config(&static_config());
        let err = provider.verify_token("tok-bogus").await.unwrap_err();
        assert!(matches!(err, TintworksError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_static_lookup_email() {
        let provider = StaticIdentityProvider::from_config(&static_config());
        assert_eq!(
            provider.lookup_email("user-ada").await.unwrap().as_deref(),
            Some("ada@example.com")
        );
        assert!(provider.lookup_email("user-noemail").await.unwrap().is_none());
        assert!(provider.lookup_email("user-ghost").await.unwrap().is_none());
    }

    #[test]
    fn test_from_config_rejects_unknown_backend() {
        let mut config = static_config();
        config.backend = "ldap".into();
        assert!(from_config(&config).is_err());
    }

    #[test]
    fn test_http_backend_requires_base_url() {
        let config = IdentityConfig {
            backend: "http".into(),
            ..IdentityConfig::default()
        };
        assert!(from_config(&config).is_err());
    }
}
