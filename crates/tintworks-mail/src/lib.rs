//! # Tintworks Mail
//!
//! Transactional email over SMTP. Delivery is best-effort and
//! fire-and-forget: callers spawn a send, log the outcome, and never retry
//! or surface a failure to the payer.

pub mod templates;

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use tintworks_core::config::MailConfig;
use tintworks_core::error::{Result, TintworksError};

pub use templates::{order_confirmation, welcome};

/// An email ready to send: subject plus HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
}

/// SMTP mailer. Constructed once at startup and injected into handlers.
pub struct Mailer {
    config: MailConfig,
    from: Mailbox,
}

impl Mailer {
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| TintworksError::Mail(format!("Invalid from address: {e}")))?;
        Ok(Self {
            config: config.clone(),
            from,
        })
    }

    /// Send one HTML email. A single attempt; the error is for the caller
    /// to log.
    pub async fn send(&self, to: &str, content: &EmailContent) -> Result<()> {
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| TintworksError::Mail(format!("Invalid recipient: {e}")))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(content.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(content.html.clone())
            .map_err(|e| TintworksError::Mail(format!("Build email: {e}")))?;

        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.resolve_password(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
            .map_err(|e| TintworksError::Mail(format!("SMTP relay: {e}")))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();

        mailer
            .send(email)
            .await
            .map_err(|e| TintworksError::Mail(format!("SMTP send: {e}")))?;

        tracing::info!("Email sent to: {to}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_builds_mailbox() {
        let config = MailConfig::default();
        let mailer = Mailer::from_config(&config).unwrap();
        assert_eq!(mailer.from.email.to_string(), "tinting-app@proton.me");
    }

    #[test]
    fn test_from_config_rejects_bad_address() {
        let config = MailConfig {
            from_address: "not an address".into(),
            ..MailConfig::default()
        };
        assert!(Mailer::from_config(&config).is_err());
    }
}
