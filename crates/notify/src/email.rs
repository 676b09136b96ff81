//! SMTP email notifier via `lettre` with TLS support.
//!
//! Delivers the digest as an HTML email to a single recipient.
//! Port 465 uses implicit TLS; every other port upgrades with STARTTLS.

use crate::traits::{Notification, Notifier, NotifyError};
use lazyhire_core::config::MailConfig;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Sends notifications as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    /// Async SMTP transport for sending emails.
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Sender mailbox.
    from: Mailbox,
    /// The one configured recipient.
    to: Mailbox,
}

impl EmailNotifier {
    /// Build an `EmailNotifier` from SMTP settings.
    ///
    /// - `smtp_host`: SMTP server hostname.
    /// - `smtp_port`: port; 465 selects implicit TLS, anything else STARTTLS.
    /// - `credentials`: optional `(username, password)` pair.
    /// - `from`: sender address (e.g. `"LazyHire Digest <bot@example.com>"`).
    /// - `to`: recipient address.
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        credentials: Option<(String, String)>,
        from: &str,
        to: &str,
    ) -> Result<Self, NotifyError> {
        let from: Mailbox = from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;
        let to: Mailbox = to
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let mut builder = if smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(smtp_port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(smtp_port)
        };

        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    /// Build from [`MailConfig`]. Fails when host, sender or recipient is missing.
    pub fn from_mail_config(config: &MailConfig) -> Result<Self, NotifyError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| NotifyError::Config("EMAIL_SMTP_HOST is not set".to_string()))?;
        let from = config
            .sender()
            .ok_or_else(|| NotifyError::Config("EMAIL_USER is not set".to_string()))?;
        let to = config
            .recipient
            .as_deref()
            .ok_or_else(|| NotifyError::Config("RECIPIENT_EMAIL is not set".to_string()))?;
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };
        Self::new(host, config.smtp_port, credentials, &from, to)
    }

    pub fn recipient(&self) -> &Mailbox {
        &self.to
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&notification.subject)
            .header(ContentType::TEXT_HTML)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            subject = %notification.subject,
            recipient = %self.to,
            "digest delivered"
        );

        Ok(())
    }

    /// Returns `"email"`.
    fn channel_name(&self) -> &str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_config() -> MailConfig {
        MailConfig {
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_port: 587,
            username: Some("bot@example.com".to_string()),
            password: Some("secret".to_string()),
            recipient: Some("me@example.com".to_string()),
            dashboard_url: "http://localhost:3000".to_string(),
        }
    }

    #[test]
    fn parse_email_with_display_name() {
        let mailbox: Result<Mailbox, _> = "LazyHire Digest <bot@example.com>".parse();
        let mb = mailbox.unwrap();
        assert_eq!(mb.email.to_string(), "bot@example.com");
    }

    #[test]
    fn new_valid() {
        let notifier = EmailNotifier::new(
            "smtp.example.com",
            587,
            None,
            "bot@example.com",
            "me@example.com",
        );
        assert!(notifier.is_ok());
    }

    #[test]
    fn new_invalid_from_address() {
        let err = EmailNotifier::new("smtp.example.com", 587, None, "bad-address", "me@example.com")
            .unwrap_err()
            .to_string();
        assert!(err.contains("Configuration error"), "got: {err}");
    }

    #[test]
    fn new_invalid_to_address() {
        let result =
            EmailNotifier::new("smtp.example.com", 587, None, "bot@example.com", "not-valid");
        assert!(result.is_err());
    }

    #[test]
    fn implicit_tls_port() {
        let notifier = EmailNotifier::new(
            "smtp.example.com",
            465,
            Some(("bot".to_string(), "pw".to_string())),
            "bot@example.com",
            "me@example.com",
        );
        assert!(notifier.is_ok());
    }

    #[test]
    fn from_mail_config_uses_digest_sender() {
        let notifier = EmailNotifier::from_mail_config(&mail_config()).unwrap();
        assert_eq!(notifier.channel_name(), "email");
        assert_eq!(notifier.recipient().email.to_string(), "me@example.com");
        assert_eq!(notifier.from.name.as_deref(), Some("LazyHire Digest"));
    }

    #[test]
    fn from_mail_config_requires_recipient() {
        let mut config = mail_config();
        config.recipient = None;
        let err = EmailNotifier::from_mail_config(&config).unwrap_err().to_string();
        assert!(err.contains("RECIPIENT_EMAIL"), "got: {err}");
    }
}
