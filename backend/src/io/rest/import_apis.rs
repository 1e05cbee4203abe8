//! # REST API for Spreadsheet Import
//!
//! Reads a hand-kept ledger spreadsheet from a URL and returns the services
//! reconstructed from it. Downloads are cached for a few minutes per URL.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

use crate::AppState;
use shared::ImportSheetRequest;

pub async fn import_sheet(State(state): State<AppState>, Json(request): Json<ImportSheetRequest>) -> impl IntoResponse {
    info!("POST /api/import/sheet - request: {:?}", request);

    match state.dashboard_service.import_sheet(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to import sheet from {}: {}", request.url, e);
            e.into_response()
        }
    }
}
