//! One ingestion run: collect, then persist the batch in a single transaction.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use lazyhire_core::ApplicationRecord;
use lazyhire_ledger::{Ledger, LedgerError};

use crate::collector::{CollectionError, Collector};

/// Default bound on a single collector call.
pub const DEFAULT_COLLECTOR_TIMEOUT: Duration = Duration::from_secs(60);

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Scheduled,
    Manual,
    Cli,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Scheduled => write!(f, "scheduled"),
            Trigger::Manual => write!(f, "manual"),
            Trigger::Cli => write!(f, "cli"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("collection failed: {0}")]
    CollectionFailed(#[source] CollectionError),

    #[error("commit failed: {0}")]
    CommitFailed(#[source] LedgerError),
}

/// Outcome of a successful run. Lives only until the digest has been handled.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub trigger: Trigger,
    /// Records the collector produced.
    pub collected: usize,
    /// Records committed by this run, in batch order.
    pub inserted: Vec<ApplicationRecord>,
    /// Records already present from an earlier run.
    pub skipped_duplicates: usize,
    pub duration: Duration,
}

impl RunReport {
    /// Rows committed by this run.
    pub fn count(&self) -> usize {
        self.inserted.len()
    }
}

/// Collect-then-persist pipeline bound to one collector and one ledger.
pub struct IngestionRun {
    collector: Arc<dyn Collector>,
    ledger: Ledger,
    collector_timeout: Duration,
}

impl IngestionRun {
    pub fn new(collector: Arc<dyn Collector>, ledger: Ledger) -> Self {
        Self {
            collector,
            ledger,
            collector_timeout: DEFAULT_COLLECTOR_TIMEOUT,
        }
    }

    pub fn with_collector_timeout(mut self, timeout: Duration) -> Self {
        self.collector_timeout = timeout;
        self
    }

    /// Execute one run.
    ///
    /// 1. Collect (bounded by the collector timeout). Failure writes nothing.
    /// 2. An empty batch succeeds with count 0 and opens no transaction.
    /// 3. Otherwise the batch is inserted in one all-or-nothing transaction.
    ///
    /// No retries happen here; callers decide what a failure means.
    pub async fn run(&self, trigger: Trigger) -> Result<RunReport, RunError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("ingestion_run", %run_id, %trigger);
        self.execute(run_id, trigger).instrument(span).await
    }

    async fn execute(&self, run_id: Uuid, trigger: Trigger) -> Result<RunReport, RunError> {
        let start = Instant::now();
        let source = self.collector.name().to_string();
        info!(collector = %source, "Ingestion run started");

        let mut batch = match tokio::time::timeout(self.collector_timeout, self.collector.collect())
            .await
        {
            Ok(Ok(batch)) => batch,
            Ok(Err(e)) => {
                error!(error = %e, "Collector failed, nothing written");
                return Err(RunError::CollectionFailed(e));
            }
            Err(_) => {
                error!(timeout = ?self.collector_timeout, "Collector timed out, nothing written");
                return Err(RunError::CollectionFailed(CollectionError::Timeout(
                    self.collector_timeout,
                )));
            }
        };

        let collected = batch.len();
        if batch.is_empty() {
            info!("No new jobs found to insert");
            return Ok(RunReport {
                run_id,
                trigger,
                collected: 0,
                inserted: Vec::new(),
                skipped_duplicates: 0,
                duration: start.elapsed(),
            });
        }

        for record in &mut batch {
            record.source.get_or_insert_with(|| source.clone());
        }

        let outcome = self.ledger.insert_many(&batch).await.map_err(|e| {
            error!(error = %e, collected, "Batch commit failed, nothing written");
            RunError::CommitFailed(e)
        })?;

        let report = RunReport {
            run_id,
            trigger,
            collected,
            inserted: outcome.inserted,
            skipped_duplicates: outcome.skipped_duplicates,
            duration: start.elapsed(),
        };
        info!(
            collected,
            inserted = report.count(),
            skipped = report.skipped_duplicates,
            duration_ms = report.duration.as_millis() as u64,
            "Ingestion run finished"
        );
        Ok(report)
    }
}
