//! JSON API endpoint modules.
//!
//! Shared error response and ledger error mapping live here in mod.rs.

mod applications;
mod health;
mod scrape;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;

use lazyhire_ledger::LedgerError;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a ledger failure to a status code. Storage faults are logged and
/// reported without detail.
pub(crate) fn ledger_error(e: LedgerError) -> ApiError {
    match e {
        LedgerError::NotFound(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
        LedgerError::Invalid(_) | LedgerError::RowRejected { .. } => {
            api_error(StatusCode::BAD_REQUEST, e.to_string())
        }
        other => {
            error!(error = %other, "Ledger operation failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

// ── Re-exports ───────────────────────────────────────────────────

pub use applications::{
    applications_create, applications_delete, applications_get, applications_list,
    applications_update_documents, applications_update_status,
};
pub use health::health;
pub use scrape::scrape;
