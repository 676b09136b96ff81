//! Collectors produce batches of candidate applications from an external source.

use async_trait::async_trait;
use chrono::Utc;
use lazyhire_core::{ApplicationStatus, NewApplication};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("source unavailable: {0}")]
    Source(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Source of candidate application records.
///
/// Implementations return the whole batch or fail; they never write to the
/// ledger themselves. A call may block on network I/O, the caller bounds it
/// with a timeout.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Collect one finite batch.
    async fn collect(&self) -> Result<Vec<NewApplication>, CollectionError>;

    /// Name recorded as the `source` of every record this collector yields.
    fn name(&self) -> &str;
}

/// Mock job board returning a fixed pair of postings dated today.
///
/// Stands in for a real crawler behind the same trait.
#[derive(Debug, Default)]
pub struct StubCollector;

#[async_trait]
impl Collector for StubCollector {
    async fn collect(&self) -> Result<Vec<NewApplication>, CollectionError> {
        tracing::info!("Running mock job collector");
        let today = Utc::now().date_naive();
        Ok(vec![
            NewApplication::new("Frontend Engineer", "Visma Oy")
                .location("Finland (Remote)")
                .status(ApplicationStatus::New)
                .notes("High priority match due to React/Vue experience.")
                .date_applied(today),
            NewApplication::new("Node.js Backend Developer", "ABB Oy")
                .location("Tampere, Finland")
                .status(ApplicationStatus::New)
                .notes("Strong Express and SQLite knowledge required.")
                .date_applied(today),
        ])
    }

    fn name(&self) -> &str {
        "stub"
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_returns_two_postings_dated_today() {
        let batch = StubCollector.collect().await.unwrap();
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].title, "Frontend Engineer");
        assert_eq!(batch[0].company, "Visma Oy");
        assert_eq!(batch[1].title, "Node.js Backend Developer");
        assert_eq!(batch[1].company, "ABB Oy");
        for record in &batch {
            assert_eq!(record.status, ApplicationStatus::New);
            assert_eq!(record.date_applied.as_deref(), Some(today.as_str()));
            assert!(record.validate().is_ok());
        }
    }
}
