//! HTTP client for the hosted payment processor.
//!
//! The processor exposes a Stripe-shaped REST API: form-encoded requests,
//! bearer-key auth, JSON responses. Only checkout-session creation is
//! consumed here.

use serde::Deserialize;

use tintworks_core::config::PaymentsConfig;
use tintworks_core::error::{Result, TintworksError};

/// Parameters for one checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutParams<'a> {
    /// Processor price identifier for the purchased service.
    pub price_id: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    /// Authenticated buyer, carried through the session as
    /// `client_reference_id` and metadata so the webhook can attribute the
    /// order.
    pub user_id: &'a str,
}

/// The processor's response: an opaque session id plus the hosted page URL
/// the buyer is redirected to.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Client for the payment processor. Constructed once at startup and
/// injected into request handlers.
pub struct PaymentClient {
    secret_key: String,
    api_base: String,
    http: reqwest::Client,
}

impl PaymentClient {
    /// Build from config. The secret key resolves environment-first
    /// (STRIPE_SECRET_KEY), matching how deployments supply it.
    pub fn from_config(config: &PaymentsConfig) -> Result<Self> {
        let secret_key = config.resolve_secret_key();
        if secret_key.is_empty() {
            return Err(TintworksError::Config(
                "Payment secret key is not set. Set STRIPE_SECRET_KEY or [payments].secret_key."
                    .into(),
            ));
        }
        Ok(Self {
            secret_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        })
    }

    /// Create a payment-mode checkout session with a single line item.
    ///
    /// Failures are terminal for the request: the caller logs and surfaces
    /// a generic internal error, never retries.
    pub async fn create_checkout_session(
        &self,
        params: CheckoutParams<'_>,
    ) -> Result<CheckoutSession> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);

        let form = [
            ("mode", "payment"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price]", params.price_id),
            ("line_items[0][quantity]", "1"),
            ("success_url", params.success_url),
            ("cancel_url", params.cancel_url),
            ("client_reference_id", params.user_id),
            ("metadata[user_id]", params.user_id),
        ];

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| TintworksError::Payment(format!("Session create request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(300).collect();
            return Err(TintworksError::Payment(format!(
                "Session create returned {status}: {excerpt}"
            )));
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| TintworksError::Payment(format!("Session create decode: {e}")))?;

        tracing::info!("Checkout session created: {}", session.id);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_secret_key() {
        let config = PaymentsConfig {
            secret_key: String::new(),
            webhook_secret: String::new(),
            api_base: "https://api.stripe.com".into(),
        };
        // Only meaningful when the env override is absent.
        if std::env::var("STRIPE_SECRET_KEY").is_err() {
            assert!(PaymentClient::from_config(&config).is_err());
        }
    }

    #[test]
    fn test_from_config_trims_trailing_slash() {
        let config = PaymentsConfig {
            secret_key: "sk_test_abc".into(),
            webhook_secret: String::new(),
            api_base: "https://payments.example.com/".into(),
        };
        let client = PaymentClient::from_config(&config).unwrap();
        assert_eq!(client.api_base, "https://payments.example.com");
    }

    #[test]
    fn test_checkout_session_decodes_without_url() {
        let session: CheckoutSession =
            serde_json::from_str(r#"{"id": "cs_test_123"}"#).unwrap();
        assert_eq!(session.id, "cs_test_123");
        assert!(session.url.is_none());
    }
}
