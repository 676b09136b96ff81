use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub message: &'static str,
}

/// Start a manual ingestion run and answer before it completes.
///
/// The run's outcome only reaches the log; manual runs never send a digest.
pub async fn scrape(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ScrapeResponse>) {
    info!("Manual scrape requested");
    // Detached: the handle is dropped and the run continues on its own.
    drop(state.scheduler.trigger_manual());
    (
        StatusCode::ACCEPTED,
        Json(ScrapeResponse {
            message: "Scraping started. Results will appear shortly.",
        }),
    )
}
