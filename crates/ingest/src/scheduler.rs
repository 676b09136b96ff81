//! Cron-driven and on-demand ingestion runs.
//!
//! Scheduled runs fire from a background task owned by [`SchedulerHandle`] and
//! send a digest when they commit anything. Manual runs are spawned detached,
//! bounded by a semaphore, and never notify.

use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use thiserror::Error;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use lazyhire_notify::{DigestNotifier, NotifyError};

use crate::run::{IngestionRun, RunError, RunReport, Trigger};

/// Daily at 00:00 UTC.
pub const DEFAULT_CRON: &str = "0 0 * * *";

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },
}

#[derive(Debug, Error)]
pub enum FireError {
    #[error(transparent)]
    Run(#[from] RunError),

    /// The batch is committed; only the digest was lost.
    #[error("digest delivery failed after committing {} records: {source}", .report.count())]
    NotifyFailed {
        report: RunReport,
        source: NotifyError,
    },
}

/// Normalize a 5-field cron expression to 6 fields by prepending a seconds field.
///
/// 5-field input uses standard day-of-week numbers (0 or 7 = Sunday), which
/// are shifted to the `cron` crate's numbering (1 = Sunday, 7 = Saturday).
/// 6-field input is passed through untouched.
fn normalize_cron(expression: &str) -> String {
    let trimmed = expression.trim();
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    if fields.len() == 5 {
        format!(
            "0 {} {} {} {} {}",
            fields[0],
            fields[1],
            fields[2],
            fields[3],
            map_day_of_week(fields[4])
        )
    } else {
        trimmed.to_string()
    }
}

fn map_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(map_day_of_week_item)
        .collect::<Vec<_>>()
        .join(",")
}

/// Map one list item (`N`, `A-B`, either with an optional `/step`). Names and
/// `*` pass through.
fn map_day_of_week_item(item: &str) -> String {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, format!("/{step}")),
        None => (item, String::new()),
    };
    let shift = |n: u8| n % 7 + 1;

    match range.split_once('-') {
        Some((start, end)) => match (start.parse::<u8>(), end.parse::<u8>()) {
            (Ok(0), Ok(7)) => format!("1-7{step}"),
            // `A-7` ends on Sunday: keep the range up to Saturday, add Sunday.
            (Ok(a), Ok(7)) if (1..7).contains(&a) => format!("{}-7{step},1", a + 1),
            (Ok(a), Ok(b)) if a <= 7 && b <= 7 => format!("{}-{}{step}", shift(a), shift(b)),
            _ => item.to_string(),
        },
        None => match range.parse::<u8>() {
            Ok(n) if n <= 7 => format!("{}{step}", shift(n)),
            _ => item.to_string(),
        },
    }
}

/// A parsed cron expression, evaluated in UTC.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: Schedule,
}

impl CronSchedule {
    /// Parse a 5-field (`min hour dom month dow`) or 6-field expression.
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let normalized = normalize_cron(expression);
        let schedule =
            Schedule::from_str(&normalized).map_err(|e| ScheduleError::InvalidCron {
                expression: expression.trim().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            expression: expression.trim().to_string(),
            schedule,
        })
    }

    /// The expression as configured, before normalization.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First tick strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }
}

/// Owns the run pipeline and decides when runs fire and whether they notify.
pub struct Scheduler {
    run: Arc<IngestionRun>,
    notifier: Arc<DigestNotifier>,
    schedule: CronSchedule,
    manual_permits: Arc<Semaphore>,
    manual_limit: usize,
    next_fire: Mutex<Option<DateTime<Utc>>>,
}

impl Scheduler {
    pub fn new(run: Arc<IngestionRun>, notifier: Arc<DigestNotifier>, schedule: CronSchedule) -> Self {
        Self {
            run,
            notifier,
            schedule,
            manual_permits: Arc::new(Semaphore::new(2)),
            manual_limit: 2,
            next_fire: Mutex::new(None),
        }
    }

    /// Cap on manual runs executing at once. Extra requests queue.
    pub fn with_manual_limit(mut self, limit: usize) -> Self {
        self.manual_limit = limit.max(1);
        self.manual_permits = Arc::new(Semaphore::new(self.manual_limit));
        self
    }

    pub fn schedule(&self) -> &CronSchedule {
        &self.schedule
    }

    /// Next scheduled tick while the loop is running, `None` when stopped.
    pub fn next_fire(&self) -> Option<DateTime<Utc>> {
        *self.next_fire.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_next_fire(&self, value: Option<DateTime<Utc>>) {
        *self.next_fire.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }

    /// Run once as the scheduled path: ingest, then send one digest if the
    /// run committed at least one record. Failures are logged and returned,
    /// never retried.
    pub async fn fire_scheduled(&self) -> Result<RunReport, FireError> {
        info!(cron = %self.schedule.expression(), "Running scheduled job scrape");

        let report = match self.run.run(Trigger::Scheduled).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Scheduled run failed, no digest sent");
                return Err(e.into());
            }
        };

        if report.count() == 0 {
            info!(run_id = %report.run_id, "Scheduled run committed nothing, no digest sent");
            return Ok(report);
        }

        if let Err(source) = self.notifier.notify(&report.inserted).await {
            error!(
                run_id = %report.run_id,
                inserted = report.count(),
                error = %source,
                "Records committed but digest was not delivered"
            );
            return Err(FireError::NotifyFailed { report, source });
        }

        Ok(report)
    }

    /// Start a manual run in the background and return immediately.
    ///
    /// The run never sends a digest. Its outcome is logged; callers that care
    /// can await the handle.
    pub fn trigger_manual(&self) -> JoinHandle<Result<RunReport, RunError>> {
        let run = Arc::clone(&self.run);
        let permits = Arc::clone(&self.manual_permits);
        tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let result = run.run(Trigger::Manual).await;
            match &result {
                Ok(report) => info!(
                    run_id = %report.run_id,
                    inserted = report.count(),
                    skipped = report.skipped_duplicates,
                    "Manual run complete"
                ),
                Err(e) => error!(error = %e, "Manual run failed"),
            }
            result
        })
    }

    /// Wait until every admitted manual run has finished. The semaphore is
    /// fair, so runs already queued for a permit complete first.
    async fn drain_manual(&self) {
        let limit = u32::try_from(self.manual_limit).unwrap_or(u32::MAX);
        if self.manual_permits.acquire_many(limit).await.is_ok() {
            debug!("Manual runs drained");
        }
    }

    /// Spawn the scheduling loop. Ticks that pass while a run is in progress
    /// are not replayed. On shutdown the loop also waits for manual runs.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);
        info!(cron = %self.schedule.expression(), "Job scheduler started");

        let task = tokio::spawn(async move {
            loop {
                let Some(next) = self.schedule.next_after(Utc::now()) else {
                    warn!(cron = %self.schedule.expression(), "Schedule has no upcoming ticks");
                    break;
                };
                self.set_next_fire(Some(next));
                let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);

                tokio::select! {
                    _ = signal.notified() => break,
                    _ = tokio::time::sleep(wait) => {
                        // Errors are already logged by fire_scheduled.
                        let _ = self.fire_scheduled().await;
                    }
                }
            }
            self.set_next_fire(None);
            self.drain_manual().await;
            info!("Job scheduler stopped");
        });

        SchedulerHandle { shutdown, task }
    }
}

/// Stops the scheduling loop. Dropping it leaves the loop running.
pub struct SchedulerHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop and wait for it to exit. Scheduled and manual runs in
    /// flight finish first.
    pub async fn stop(self) {
        self.shutdown.notify_one();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
    }
}
