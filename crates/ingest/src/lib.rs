//! Automated ingestion pipeline.
//!
//! A [`Collector`](collector::Collector) produces candidate applications, an
//! [`IngestionRun`](run::IngestionRun) persists them in one ledger transaction,
//! and the [`Scheduler`](scheduler::Scheduler) fires runs daily (with a digest)
//! or on demand (without one).

pub mod collector;
pub mod run;
pub mod scheduler;

pub use collector::{CollectionError, Collector, StubCollector};
pub use run::{IngestionRun, RunError, RunReport, Trigger};
pub use scheduler::{CronSchedule, FireError, ScheduleError, Scheduler, SchedulerHandle, DEFAULT_CRON};
