//! Composes one digest per batch of new records and delivers it.

use std::time::Instant;

use lazyhire_core::ApplicationRecord;

use crate::templating::{DigestContext, TemplateRenderer};
use crate::traits::{Notification, Notifier, NotifyError};

/// Builds the digest for newly inserted records and hands it to one channel.
pub struct DigestNotifier {
    channel: Box<dyn Notifier>,
    renderer: TemplateRenderer,
    dashboard_url: String,
}

impl DigestNotifier {
    pub fn new(channel: Box<dyn Notifier>, dashboard_url: impl Into<String>) -> Self {
        Self {
            channel,
            renderer: TemplateRenderer::new(),
            dashboard_url: dashboard_url.into(),
        }
    }

    pub fn with_renderer(mut self, renderer: TemplateRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn channel_name(&self) -> &str {
        self.channel.channel_name()
    }

    /// Check that the digest templates parse.
    pub fn validate(&self) -> Result<(), NotifyError> {
        self.renderer.validate()
    }

    /// Render the digest for `records`.
    pub fn compose(&self, records: &[ApplicationRecord]) -> Result<Notification, NotifyError> {
        let ctx = DigestContext::new(records, &self.dashboard_url);
        let (subject, body) = self.renderer.render(&ctx)?;
        Ok(Notification {
            subject,
            body,
            record_count: records.len(),
        })
    }

    /// Send one digest summarizing `records`. Does nothing for an empty slice.
    pub async fn notify(&self, records: &[ApplicationRecord]) -> Result<(), NotifyError> {
        if records.is_empty() {
            tracing::info!("No new applications, digest skipped");
            return Ok(());
        }

        let notification = self.compose(records)?;
        let start = Instant::now();
        match self.channel.send(&notification).await {
            Ok(()) => {
                tracing::info!(
                    channel = self.channel.channel_name(),
                    records = records.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Digest sent"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    channel = self.channel.channel_name(),
                    error = %e,
                    "Digest delivery failed"
                );
                Err(e)
            }
        }
    }
}
