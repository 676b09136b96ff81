//! Application configuration builders.
//!
//! Constructs the collector, the digest notifier and the ingestion pipeline
//! from `Config`.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use lazyhire_core::config::{MailConfig, ScheduleConfig};
use lazyhire_core::Config;
use lazyhire_ingest::{Collector, CronSchedule, IngestionRun, Scheduler, StubCollector};
use lazyhire_ledger::Ledger;
use lazyhire_notify::email::EmailNotifier;
use lazyhire_notify::log::LogNotifier;
use lazyhire_notify::{DigestNotifier, Notifier};

use crate::state::AppState;

/// Load configuration from `.env` and environment variables.
pub fn load_config() -> Config {
    lazyhire_core::config::load_dotenv();
    Config::from_env()
}

/// The job-board collector. Only the mock board exists so far.
pub fn build_collector() -> Arc<dyn Collector> {
    Arc::new(StubCollector)
}

/// Digest notifier over SMTP when mail is configured, otherwise over the log.
///
/// Configured but unusable mail settings fail startup instead of silently
/// falling back to the log. Templates are checked once here.
pub fn build_notifier(mail: &MailConfig) -> anyhow::Result<DigestNotifier> {
    let channel: Box<dyn Notifier> = if mail.is_configured() {
        let email = EmailNotifier::from_mail_config(mail)
            .context("invalid digest mail settings")?;
        info!(recipient = %email.recipient(), "Digest email channel ready");
        Box::new(email)
    } else {
        info!("Mail not configured, digests go to the log");
        Box::new(LogNotifier)
    };
    let notifier = DigestNotifier::new(channel, mail.dashboard_url.clone());
    notifier.validate().context("invalid digest template")?;
    Ok(notifier)
}

/// Wire the ledger, collector and notifier into the run pipeline and scheduler.
pub fn assemble(
    ledger: Ledger,
    collector: Arc<dyn Collector>,
    notifier: DigestNotifier,
    schedule: &ScheduleConfig,
) -> anyhow::Result<Arc<AppState>> {
    let cron = CronSchedule::parse(&schedule.cron)?;
    let run = Arc::new(
        IngestionRun::new(collector, ledger.clone())
            .with_collector_timeout(schedule.collector_timeout()),
    );
    let scheduler = Scheduler::new(Arc::clone(&run), Arc::new(notifier), cron)
        .with_manual_limit(schedule.max_concurrent_manual_runs as usize);

    Ok(Arc::new(AppState {
        ledger,
        run,
        scheduler: Arc::new(scheduler),
    }))
}

/// Connect the ledger and build the full application state.
pub async fn build_app_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let ledger = Ledger::connect(&config.database).await?;
    info!(applications = ledger.count().await?, "Ledger ready");
    assemble(
        ledger,
        build_collector(),
        build_notifier(&config.mail)?,
        &config.schedule,
    )
}
