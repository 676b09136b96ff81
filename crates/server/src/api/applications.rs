//! Tracker CRUD over the ledger.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use lazyhire_core::{
    status_counts, ApplicationId, ApplicationRecord, ApplicationStatus, DocumentUpdate,
    NewApplication, StatusCount,
};

use crate::state::AppState;

use super::{api_error, ledger_error, ApiError};

#[derive(Serialize)]
pub struct ApplicationsResponse {
    pub applications: Vec<ApplicationRecord>,
    pub counts: Vec<StatusCount>,
}

/// Manual entry from the dashboard form.
#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    /// `YYYY-MM-DD`
    pub date_applied: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// All records, newest first, with per-status counts.
pub async fn applications_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApplicationsResponse>, ApiError> {
    let applications = state.ledger.list_recent().await.map_err(ledger_error)?;
    let counts = status_counts(&applications);
    Ok(Json(ApplicationsResponse {
        applications,
        counts,
    }))
}

pub async fn applications_create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<ApplicationRecord>), ApiError> {
    let record = NewApplication {
        location: req.location.filter(|s| !s.trim().is_empty()),
        notes: req.notes.filter(|s| !s.trim().is_empty()),
        date_applied: req.date_applied.filter(|s| !s.trim().is_empty()),
        ..NewApplication::new(req.title, req.company)
    };
    let created = state.ledger.insert(&record).await.map_err(ledger_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn applications_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ApplicationId>,
) -> Result<Json<ApplicationRecord>, ApiError> {
    state.ledger.get(id).await.map(Json).map_err(ledger_error)
}

/// Any status may move to any other.
pub async fn applications_update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ApplicationId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApplicationRecord>, ApiError> {
    let status: ApplicationStatus = req
        .status
        .parse()
        .map_err(|e: lazyhire_core::ValidationError| {
            api_error(StatusCode::BAD_REQUEST, e.to_string())
        })?;
    state
        .ledger
        .update_status(id, status)
        .await
        .map(Json)
        .map_err(ledger_error)
}

pub async fn applications_update_documents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ApplicationId>,
    Json(update): Json<DocumentUpdate>,
) -> Result<Json<ApplicationRecord>, ApiError> {
    state
        .ledger
        .update_documents(id, &update)
        .await
        .map(Json)
        .map_err(ledger_error)
}

pub async fn applications_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ApplicationId>,
) -> Result<StatusCode, ApiError> {
    state.ledger.delete(id).await.map_err(ledger_error)?;
    Ok(StatusCode::NO_CONTENT)
}
