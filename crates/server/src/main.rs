mod api;
mod app_config;
mod cli;
mod router;
mod state;

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lazyhire_core::Config;
use lazyhire_ingest::{FireError, Trigger};

use crate::cli::{Cli, Command};

async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = app_config::build_app_state(config).await?;
    let scheduler = Arc::clone(&state.scheduler).start();
    if let Some(next) = state.scheduler.next_fire() {
        info!(next = %next, "Next scheduled scrape");
    }

    let app = router::build_router(Arc::clone(&state), &config.server.cors_origin);
    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    info!("Server listening on http://localhost:{}", config.server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// One foreground run. With `notify`, the digest policy of the scheduled path applies.
async fn run_once(config: &Config, notify: bool) -> anyhow::Result<()> {
    let state = app_config::build_app_state(config).await?;
    let report = if notify {
        match state.scheduler.fire_scheduled().await {
            Ok(report) => report,
            Err(FireError::NotifyFailed { report, source }) => {
                warn!(error = %source, "Run committed but the digest was not sent");
                report
            }
            Err(FireError::Run(e)) => return Err(e.into()),
        }
    } else {
        state.run.run(Trigger::Cli).await?
    };

    info!(
        run_id = %report.run_id,
        collected = report.collected,
        inserted = report.count(),
        skipped = report.skipped_duplicates,
        "Run complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = app_config::load_config();
    config.log_summary();

    match cli.command() {
        Command::Serve => serve(&config).await,
        Command::RunOnce { notify } => run_once(&config, notify).await,
    }
}
