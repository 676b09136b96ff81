//! Log channel: writes the digest to the tracing log instead of mailing it.
//!
//! Used when no SMTP server is configured, so scheduled runs still leave a
//! record of what would have been sent.

use crate::traits::{Notification, Notifier, NotifyError};

#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            channel = "log",
            subject = %notification.subject,
            records = notification.record_count,
            "digest (mail not configured):\n{}",
            notification.body
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_channel_always_succeeds() {
        let notification = Notification {
            subject: "s".to_string(),
            body: "b".to_string(),
            record_count: 1,
        };
        assert!(LogNotifier.send(&notification).await.is_ok());
        assert_eq!(LogNotifier.channel_name(), "log");
    }
}
